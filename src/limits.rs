pub const MAX_STASHPOINTS: usize = 100_000;
pub const MAX_RESERVATIONS_PER_STASHPOINT: usize = 100_000;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_ADDRESS_LEN: usize = 1024;
