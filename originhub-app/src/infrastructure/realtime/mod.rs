mod broadcast_hub;

pub use broadcast_hub::BroadcastHub;
