mod message;
mod thin;

pub(crate) use crate::protocol::thin::ThinProtocol;
