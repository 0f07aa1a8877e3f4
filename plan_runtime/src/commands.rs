use std::fmt;

use serde::Serialize;

/// Number of impulses a unit executes in one turn.
pub const IMPULSES_PER_TURN: u32 = 3;

/// Atomic action inside a turn command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Impulse {
    /// Consume one unit of movement.
    Step,
    /// Extract points from the unit's current cell without moving.
    Dig,
}

impl Impulse {
    pub const fn as_char(self) -> char {
        match self {
            Impulse::Step => 'S',
            Impulse::Dig => 'D',
        }
    }
}

/// Ordered triple of impulses executed in one turn.
///
/// The alphabet is closed: every arrangement of three Step/Dig impulses is a
/// variant, so a `Command` value is always well formed. Dig position decides
/// which cells are dug, which is why orderings with the same step count are
/// distinct planning alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Ddd,
    Sdd,
    Dsd,
    Dds,
    Dss,
    Sds,
    Ssd,
    Sss,
}

const DISTANCE_0: [Command; 1] = [Command::Ddd];
const DISTANCE_1: [Command; 3] = [Command::Sdd, Command::Dsd, Command::Dds];
const DISTANCE_2: [Command; 3] = [Command::Dss, Command::Sds, Command::Ssd];
const DISTANCE_3: [Command; 1] = [Command::Sss];

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Ddd,
        Command::Sdd,
        Command::Dsd,
        Command::Dds,
        Command::Dss,
        Command::Sds,
        Command::Ssd,
        Command::Sss,
    ];

    /// Commands whose step count matches `distance`, in generation order.
    ///
    /// Distances outside `0..=IMPULSES_PER_TURN` yield nothing.
    pub fn for_distance(distance: u32) -> impl Iterator<Item = Command> {
        let set: &'static [Command] = match distance {
            0 => &DISTANCE_0,
            1 => &DISTANCE_1,
            2 => &DISTANCE_2,
            3 => &DISTANCE_3,
            _ => &[],
        };
        set.iter().copied()
    }

    pub const fn impulses(self) -> [Impulse; 3] {
        use Impulse::{Dig as D, Step as S};
        match self {
            Command::Ddd => [D, D, D],
            Command::Sdd => [S, D, D],
            Command::Dsd => [D, S, D],
            Command::Dds => [D, D, S],
            Command::Dss => [D, S, S],
            Command::Sds => [S, D, S],
            Command::Ssd => [S, S, D],
            Command::Sss => [S, S, S],
        }
    }

    pub const fn from_impulses(impulses: [Impulse; 3]) -> Self {
        use Impulse::{Dig as D, Step as S};
        match impulses {
            [D, D, D] => Command::Ddd,
            [S, D, D] => Command::Sdd,
            [D, S, D] => Command::Dsd,
            [D, D, S] => Command::Dds,
            [D, S, S] => Command::Dss,
            [S, D, S] => Command::Sds,
            [S, S, D] => Command::Ssd,
            [S, S, S] => Command::Sss,
        }
    }

    pub fn steps(self) -> u32 {
        self.impulses()
            .iter()
            .filter(|impulse| **impulse == Impulse::Step)
            .count() as u32
    }

    pub fn digs(self) -> u32 {
        IMPULSES_PER_TURN - self.steps()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Ddd => "DDD",
            Command::Sdd => "SDD",
            Command::Dsd => "DSD",
            Command::Dds => "DDS",
            Command::Dss => "DSS",
            Command::Sds => "SDS",
            Command::Ssd => "SSD",
            Command::Sss => "SSS",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One impulse of a unit's written orders, as submitted to the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderImpulse {
    North,
    South,
    West,
    East,
    /// `.`: spend the impulse in place.
    Stay,
    /// `H`: hold position.
    Hold,
    Dig,
    /// Single-letter actions (`U`, `C`) that never move the unit.
    Action(char),
    /// `T(label)`: jump to the named teleport pad.
    Teleport(String),
}

impl OrderImpulse {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'N' => Some(OrderImpulse::North),
            'S' => Some(OrderImpulse::South),
            'W' => Some(OrderImpulse::West),
            'E' => Some(OrderImpulse::East),
            '.' => Some(OrderImpulse::Stay),
            'H' => Some(OrderImpulse::Hold),
            'D' => Some(OrderImpulse::Dig),
            'U' | 'C' => Some(OrderImpulse::Action(letter)),
            _ => None,
        }
    }

    /// Column and row offset of a compass move.
    pub fn offset(&self) -> Option<(i64, i64)> {
        match self {
            OrderImpulse::North => Some((0, -1)),
            OrderImpulse::South => Some((0, 1)),
            OrderImpulse::West => Some((-1, 0)),
            OrderImpulse::East => Some((1, 0)),
            _ => None,
        }
    }
}

impl fmt::Display for OrderImpulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderImpulse::North => f.write_str("N"),
            OrderImpulse::South => f.write_str("S"),
            OrderImpulse::West => f.write_str("W"),
            OrderImpulse::East => f.write_str("E"),
            OrderImpulse::Stay => f.write_str("."),
            OrderImpulse::Hold => f.write_str("H"),
            OrderImpulse::Dig => f.write_str("D"),
            OrderImpulse::Action(letter) => write!(f, "{letter}"),
            OrderImpulse::Teleport(label) => write!(f, "T({label})"),
        }
    }
}
