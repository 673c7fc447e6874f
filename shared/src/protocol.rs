//! Line-based text protocol spoken over the game socket.
//!
//! A frame is a list of fields joined by [`DELIMITER`]. Field 0 is the kind
//! tag, the rest are positional:
//!
//! | Kind         | Fields                                              |
//! |--------------|-----------------------------------------------------|
//! | HELLO        | playerId (may be empty)                             |
//! | PING         | none, or timestamp, or timestamp + latency          |
//! | PONG         | timestamp                                           |
//! | ONLINE       | count                                               |
//! | QUEUE        | none                                                |
//! | UNQUEUE      | none                                                |
//! | GAME         | roomId                                              |
//! | EXITGAME     | reason                                              |
//! | WORLD        | selfX selfY opponentX opponentY puckX puckY countA countB |
//! | PLAYERACTION | x y                                                 |
//!
//! Decoding is permissive on purpose: anything it cannot make sense of is
//! `None` and the caller drops it.

use crate::{Position, Score};
use std::fmt;

pub const DELIMITER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Hello,
    Ping,
    Pong,
    Online,
    Queue,
    UnQueue,
    Game,
    ExitGame,
    World,
    PlayerAction,
}

impl MessageKind {
    pub const ALL: [MessageKind; 10] = [
        MessageKind::Hello,
        MessageKind::Ping,
        MessageKind::Pong,
        MessageKind::Online,
        MessageKind::Queue,
        MessageKind::UnQueue,
        MessageKind::Game,
        MessageKind::ExitGame,
        MessageKind::World,
        MessageKind::PlayerAction,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Ping => "PING",
            MessageKind::Pong => "PONG",
            MessageKind::Online => "ONLINE",
            MessageKind::Queue => "QUEUE",
            MessageKind::UnQueue => "UNQUEUE",
            MessageKind::Game => "GAME",
            MessageKind::ExitGame => "EXITGAME",
            MessageKind::World => "WORLD",
            MessageKind::PlayerAction => "PLAYERACTION",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Timing payload of a server-initiated liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingStamp {
    /// Server clock in milliseconds, echoed back in the Pong.
    pub timestamp: i64,
    /// Round trip the server measured for the previous probe, if it reports one.
    pub latency: Option<i64>,
}

/// Authoritative state at one instant, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub own: Position,
    pub opponent: Position,
    pub puck: Position,
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Client sends its stored id (empty when it has none); the server answers
    /// with the id the client should keep.
    Hello { player_id: String },
    /// Payload-less when the client probes; stamped when the server probes.
    Ping { stamp: Option<PingStamp> },
    Pong { timestamp: i64 },
    Online { count: u32 },
    Queue,
    UnQueue,
    Game { room_id: String },
    ExitGame { reason: String },
    World(WorldSnapshot),
    PlayerAction { position: Position },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Hello { .. } => MessageKind::Hello,
            Message::Ping { .. } => MessageKind::Ping,
            Message::Pong { .. } => MessageKind::Pong,
            Message::Online { .. } => MessageKind::Online,
            Message::Queue => MessageKind::Queue,
            Message::UnQueue => MessageKind::UnQueue,
            Message::Game { .. } => MessageKind::Game,
            Message::ExitGame { .. } => MessageKind::ExitGame,
            Message::World(_) => MessageKind::World,
            Message::PlayerAction { .. } => MessageKind::PlayerAction,
        }
    }

    pub fn hello(player_id: Option<&str>) -> Self {
        Message::Hello {
            player_id: player_id.unwrap_or_default().to_string(),
        }
    }

    pub fn exit_game(reason: impl Into<String>) -> Self {
        Message::ExitGame {
            reason: reason.into(),
        }
    }

    /// The id carried by a Hello, `None` when the field was empty.
    pub fn player_id(&self) -> Option<&str> {
        match self {
            Message::Hello { player_id } if !player_id.is_empty() => Some(player_id),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

pub fn encode(message: &Message) -> String {
    let tag = message.kind().tag();
    let d = DELIMITER;

    match message {
        Message::Hello { player_id } => format!("{tag}{d}{player_id}"),
        Message::Ping { stamp: None } => tag.to_string(),
        Message::Ping {
            stamp: Some(PingStamp {
                timestamp,
                latency: None,
            }),
        } => format!("{tag}{d}{timestamp}"),
        Message::Ping {
            stamp: Some(PingStamp {
                timestamp,
                latency: Some(latency),
            }),
        } => format!("{tag}{d}{timestamp}{d}{latency}"),
        Message::Pong { timestamp } => format!("{tag}{d}{timestamp}"),
        Message::Online { count } => format!("{tag}{d}{count}"),
        Message::Queue | Message::UnQueue => tag.to_string(),
        Message::Game { room_id } => format!("{tag}{d}{room_id}"),
        Message::ExitGame { reason } => format!("{tag}{d}{reason}"),
        Message::World(world) => format!(
            "{tag}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            world.own.x,
            world.own.y,
            world.opponent.x,
            world.opponent.y,
            world.puck.x,
            world.puck.y,
            world.score.a,
            world.score.b,
        ),
        Message::PlayerAction { position } => {
            format!("{tag}{d}{}{d}{}", position.x, position.y)
        }
    }
}

/// Parses one frame. Empty frames, unknown tags, missing fields and numeric
/// parse failures all yield `None`.
pub fn decode(frame: &str) -> Option<Message> {
    let (tag, rest) = match frame.split_once(DELIMITER) {
        Some((tag, rest)) => (tag, Some(rest)),
        None => (frame, None),
    };

    let kind = MessageKind::from_tag(tag)?;
    let mut fields = Fields::new(rest);

    let message = match kind {
        MessageKind::Hello => Message::Hello {
            player_id: fields.remainder()?.to_string(),
        },
        MessageKind::Ping => {
            let stamp = match fields.next() {
                None => None,
                Some(timestamp) => Some(PingStamp {
                    timestamp: parse_number(timestamp)?,
                    latency: match fields.next() {
                        None => None,
                        Some(latency) => Some(parse_number(latency)?),
                    },
                }),
            };
            Message::Ping { stamp }
        }
        MessageKind::Pong => Message::Pong {
            timestamp: fields.number()?,
        },
        MessageKind::Online => Message::Online {
            count: fields.number()?,
        },
        MessageKind::Queue => Message::Queue,
        MessageKind::UnQueue => Message::UnQueue,
        MessageKind::Game => Message::Game {
            room_id: fields.remainder()?.to_string(),
        },
        MessageKind::ExitGame => Message::ExitGame {
            reason: fields.remainder()?.to_string(),
        },
        MessageKind::World => Message::World(WorldSnapshot {
            own: fields.position()?,
            opponent: fields.position()?,
            puck: fields.position()?,
            score: Score::new(fields.number()?, fields.number()?),
        }),
        MessageKind::PlayerAction => Message::PlayerAction {
            position: fields.position()?,
        },
    };

    Some(message)
}

/// Lenient numeric parse: tolerates surrounding whitespace, a leading `+`
/// and integral decimal notation such as `12.0`.
pub fn parse_number<T>(field: &str) -> Option<T>
where
    T: TryFrom<i64>,
{
    let field = field.trim();
    let field = field.strip_prefix('+').unwrap_or(field);

    let value = match field.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            let value = field.parse::<f64>().ok()?;
            if !value.is_finite() || value.fract() != 0.0 {
                return None;
            }
            if value < i64::MIN as f64 || value >= i64::MAX as f64 {
                return None;
            }
            value as i64
        }
    };

    T::try_from(value).ok()
}

struct Fields<'a> {
    rest: Option<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(rest: Option<&'a str>) -> Self {
        Self { rest }
    }

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.split_once(DELIMITER) {
            Some((field, tail)) => {
                self.rest = Some(tail);
                Some(field)
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }

    /// Everything after the tag that has not been consumed, delimiters included.
    fn remainder(&mut self) -> Option<&'a str> {
        self.rest.take()
    }

    fn number<T: TryFrom<i64>>(&mut self) -> Option<T> {
        parse_number(self.next()?)
    }

    fn position(&mut self) -> Option<Position> {
        Some(Position::new(self.number()?, self.number()?))
    }
}
