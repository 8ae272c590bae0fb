//! Application settings
//!
//! Player name, group, dice colors and the realtime endpoint. Settings are
//! stored in the embedded preference database and can be overridden from the
//! environment and the command line.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::database::PreferenceStore;
use super::roll::DiceColor;

/// Environment variable holding the realtime endpoint.
pub const REALTIME_URL_ENV: &str = "DICETRAY_REALTIME_URL";
/// Environment variable holding the realtime anonymous key.
pub const REALTIME_KEY_ENV: &str = "DICETRAY_REALTIME_KEY";
/// Marker used by unconfigured deployments in place of real credentials.
const PLACEHOLDER_MARKER: &str = "!!!";

const ADJECTIVES: &[&str] = &[
    "brave", "calm", "clever", "daring", "eager", "fancy", "gentle", "happy", "jolly", "keen",
    "lucky", "mighty", "nimble", "proud", "quick", "quiet", "rusty", "shy", "swift", "witty",
];

const ANIMALS: &[&str] = &[
    "badger", "bison", "crane", "dingo", "falcon", "ferret", "gecko", "heron", "ibis", "jackal",
    "koala", "lemur", "marmot", "narwhal", "ocelot", "otter", "panda", "quokka", "raven", "walrus",
];

/// Random "adjective-animal" display name.
pub fn generate_display_name<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("anonymous");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("thrower");
    format!("{}-{}", adjective, animal)
}

/// Simple serializable RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSetting {
    #[serde(default)]
    pub a: f32,
    #[serde(default)]
    pub r: f32,
    #[serde(default)]
    pub g: f32,
    #[serde(default)]
    pub b: f32,
}

impl Default for ColorSetting {
    fn default() -> Self {
        Self::rgb(1.0, 0.0, 0.0)
    }
}

impl ColorSetting {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { a: 1.0, r, g, b }
    }

    pub fn to_color(&self) -> Color {
        Color::srgba(self.r, self.g, self.b, self.a)
    }

    /// Parse from various string formats:
    /// - any CSS color ("#ff0000", "red", "rgb(255 0 0)", "hsl(0 100% 50%)")
    /// - "A:1.0 R:0.5 G:0.3 B:0.2"
    /// - "1.0,0.5,0.3,0.2" (ARGB order) or "0.5,0.3,0.2" (RGB)
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if input.contains(':') && !input.contains('(') {
            return Self::parse_labeled(input);
        }

        if input.contains(',') && !input.contains('(') {
            return Self::parse_csv(input);
        }

        Self::parse_css(input)
    }

    /// CSS colors only. Colors carried by a roll request, including those
    /// received from other players, go through here.
    pub fn parse_css(input: &str) -> Option<Self> {
        let color = csscolorparser::parse(input.trim()).ok()?;
        Some(Self {
            a: color.a as f32,
            r: color.r as f32,
            g: color.g as f32,
            b: color.b as f32,
        })
    }

    fn parse_labeled(input: &str) -> Option<Self> {
        let mut a = 1.0f32;
        let mut r = 0.0f32;
        let mut g = 0.0f32;
        let mut b = 0.0f32;

        for part in input.split_whitespace() {
            if let Some((label, value)) = part.split_once(':') {
                let val: f32 = value.trim_end_matches(',').parse().ok()?;
                match label.to_uppercase().as_str() {
                    "A" => a = val.clamp(0.0, 1.0),
                    "R" => r = val.clamp(0.0, 1.0),
                    "G" => g = val.clamp(0.0, 1.0),
                    "B" => b = val.clamp(0.0, 1.0),
                    _ => {}
                }
            }
        }

        Some(Self { a, r, g, b })
    }

    fn parse_csv(input: &str) -> Option<Self> {
        let parts = input
            .split(',')
            .map(|p| p.trim().parse::<f32>().map(|v| v.clamp(0.0, 1.0)))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;

        match parts.as_slice() {
            [a, r, g, b] => Some(Self {
                a: *a,
                r: *r,
                g: *g,
                b: *b,
            }),
            [r, g, b] => Some(Self::rgb(*r, *g, *b)),
            _ => None,
        }
    }

    /// CSS hex form, `#rrggbb` or `#rrggbbaa` when translucent.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

/// Realtime endpoint and key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl RealtimeSettings {
    /// Both values present and neither is a placeholder.
    pub fn is_configured(&self) -> bool {
        let usable = |v: &Option<String>| {
            v.as_deref()
                .map(|s| !s.trim().is_empty() && !s.contains(PLACEHOLDER_MARKER))
                .unwrap_or(false)
        };
        usable(&self.url) && usable(&self.api_key)
    }

    /// Overlay values found in the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(REALTIME_URL_ENV).ok(),
            std::env::var(REALTIME_KEY_ENV).ok(),
        );
    }

    pub fn apply_overrides(&mut self, url: Option<String>, api_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.contains(PLACEHOLDER_MARKER)) {
            self.url = Some(url);
        }
        if let Some(key) = api_key.filter(|k| !k.contains(PLACEHOLDER_MARKER)) {
            self.api_key = Some(key);
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_group")]
    pub group: String,

    #[serde(default = "default_dice_color")]
    pub dice_color: ColorSetting,

    #[serde(default = "default_text_color")]
    pub text_color: ColorSetting,

    /// Announce local rolls to the group.
    #[serde(default = "default_share_rolls")]
    pub share_rolls: bool,

    /// Seconds before an unsettled roll is forced to finish.
    #[serde(default = "default_settle_timeout_secs")]
    pub settle_timeout_secs: f32,

    #[serde(default)]
    pub realtime: RealtimeSettings,
}

fn default_name() -> String {
    generate_display_name(&mut rand::thread_rng())
}

fn default_group() -> String {
    "public".to_string()
}

fn default_dice_color() -> ColorSetting {
    ColorSetting::rgb(1.0, 0.0, 0.0)
}

fn default_text_color() -> ColorSetting {
    ColorSetting::rgb(0.0, 0.0, 0.0)
}

fn default_share_rolls() -> bool {
    true
}

fn default_settle_timeout_secs() -> f32 {
    15.0
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            group: default_group(),
            dice_color: default_dice_color(),
            text_color: default_text_color(),
            share_rolls: default_share_rolls(),
            settle_timeout_secs: default_settle_timeout_secs(),
            realtime: RealtimeSettings::default(),
        }
    }
}

impl AppSettings {
    const SETTINGS_DB_KEY: &'static str = "app_settings";

    /// Load settings from the preference store, falling back to defaults.
    ///
    /// The second value is true when nothing was stored yet, so the caller
    /// can persist the freshly generated name.
    pub fn load_from(db: &PreferenceStore) -> (Self, bool) {
        match db.get_setting::<AppSettings>(Self::SETTINGS_DB_KEY) {
            Ok(Some(settings)) => {
                info!("Loaded settings from SurrealDB");
                (settings, false)
            }
            Ok(None) => (Self::default(), true),
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                (Self::default(), true)
            }
        }
    }

    pub fn save_to_db(&self, db: &PreferenceStore) -> Result<(), String> {
        db.set_setting(Self::SETTINGS_DB_KEY, self.clone())
    }

    /// Colors as the wire pair sent with a throw.
    pub fn dice_color_pair(&self) -> DiceColor {
        DiceColor {
            base: self.dice_color.to_hex(),
            text: self.text_color.to_hex(),
        }
    }
}

/// Resource holding the live settings
#[derive(Resource, Debug, Clone)]
pub struct SettingsState {
    pub settings: AppSettings,
    /// Set when the settings changed and should be persisted.
    pub modified: bool,
}

impl SettingsState {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            modified: false,
        }
    }
}

impl Default for SettingsState {
    fn default() -> Self {
        Self::new(AppSettings::default())
    }
}
