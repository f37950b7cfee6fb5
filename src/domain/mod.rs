pub mod board;
pub mod ids;
pub mod ticket;
