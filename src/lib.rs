pub mod dice3d;
pub mod realtime;
