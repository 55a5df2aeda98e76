// Purpose - external interfaces, wire format decoding

pub mod midi;
