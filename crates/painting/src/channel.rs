//! Channel model for splat maps
//!
//! A four-channel splat map encodes up to five material layers: one per
//! channel plus the implicit base layer where every weight is zero.
//! Painting blends toward the active channel's one-hot weight vector.

use serde::{Deserialize, Serialize};
use splat_painter_config::ChannelSetting;

/// Paintable channel of a splat map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    #[default]
    R = 0,
    G = 1,
    B = 2,
    A = 3,
    /// No-op selector: dabs leave every weight unchanged
    None = 4,
}

impl Channel {
    /// All channels in layer order
    pub const ALL: [Channel; 5] = [
        Channel::R,
        Channel::G,
        Channel::B,
        Channel::A,
        Channel::None,
    ];

    /// One-hot weight vector for this channel (all zero for `None`)
    pub const fn weights(self) -> [f32; 4] {
        match self {
            Channel::R => [1.0, 0.0, 0.0, 0.0],
            Channel::G => [0.0, 1.0, 0.0, 0.0],
            Channel::B => [0.0, 0.0, 1.0, 0.0],
            Channel::A => [0.0, 0.0, 0.0, 1.0],
            Channel::None => [0.0, 0.0, 0.0, 0.0],
        }
    }

    /// Layer index used by the channel selector previews
    #[inline]
    pub const fn layer_index(self) -> usize {
        self as usize
    }
}

impl From<ChannelSetting> for Channel {
    fn from(setting: ChannelSetting) -> Self {
        match setting {
            ChannelSetting::R => Channel::R,
            ChannelSetting::G => Channel::G,
            ChannelSetting::B => Channel::B,
            ChannelSetting::A => Channel::A,
            ChannelSetting::None => Channel::None,
        }
    }
}

impl From<Channel> for ChannelSetting {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::R => ChannelSetting::R,
            Channel::G => ChannelSetting::G,
            Channel::B => ChannelSetting::B,
            Channel::A => ChannelSetting::A,
            Channel::None => ChannelSetting::None,
        }
    }
}
