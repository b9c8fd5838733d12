mod channel;
mod rabbit;
pub mod topology;

pub use channel::{ChannelError, MessageChannel};
pub use rabbit::{build_pool, Pool, RabbitError};
