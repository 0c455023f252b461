pub mod audio;
pub mod dispatcher;
pub mod lifecycle;
pub mod payouts;
pub mod refunds;
pub mod storage;
pub mod stripe;
pub mod worker;
