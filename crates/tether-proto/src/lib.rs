//! # tether-proto
//!
//! Wire types for the gateway protocol spoken by the Tether client.
//!
//! Inbound frames are parsed once into a [`RawEnvelope`] and then decoded into
//! a [`GatewayPayload`] after the operation code is known. Outbound frames are
//! built from [`GatewayCommand`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod envelope;
pub mod error;
pub mod events;
pub mod interaction;
pub mod opcode;

pub use commands::{ConnectionProperties, GatewayCommand, Identify, Resume};
pub use envelope::{Dispatch, GatewayPayload, Hello, RawEnvelope};
pub use error::ProtoError;
pub use events::{DispatchEvent, Ready};
pub use interaction::{
    CommandOption, Embed, EmbedImage, GuildMember, Interaction, InteractionCallbackData,
    InteractionData, InteractionResponse, ResolvedEntities, User,
};
pub use opcode::OpCode;
