//! Keep frames coming while the simulation runs.
//!
//! The window only updates reactively. A roll in flight, or dice still
//! waiting to launch, asks for another frame so the fixed-step physics keeps
//! advancing.

use bevy::prelude::*;
use bevy::window::RequestRedraw;

use crate::dice3d::session::RollSession;
use crate::dice3d::types::PendingLaunch;

pub fn request_redraw_while_rolling(
    session: Res<RollSession>,
    pending: Query<(), With<PendingLaunch>>,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    if session.is_rolling() || !pending.is_empty() {
        redraw.write(RequestRedraw);
    }
}
