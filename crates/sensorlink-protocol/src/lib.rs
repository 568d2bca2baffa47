pub mod builder;
pub mod codec;
pub mod commands;
pub mod fields;
pub mod framing;
pub mod message;
mod parser;
pub mod value;

pub use builder::MessageBuilder;
pub use codec::{decode_message, split_lines, strip_framing};
pub use commands::DeviceCommand;
pub use framing::LineAssembler;
pub use message::DecodedMessage;
pub use value::FieldValue;
