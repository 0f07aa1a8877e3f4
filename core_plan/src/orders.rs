//! Written orders: turning planned commands into order letters and replaying
//! order letters into the cells a unit visits.

use plan_runtime::{Command, Impulse, OrderImpulse};
use thiserror::Error;

use crate::{board::Coord, board::Extent, planner_config::TeleportTable};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderTraceError {
    #[error("impulse {position} ({impulse}) leaves the board at {from}")]
    OffBoard {
        position: usize,
        impulse: String,
        from: Coord,
    },
    #[error("no teleport pad named '{0}'")]
    UnknownTeleport(String),
    #[error("route of {len} cells does not fit command {command}")]
    BrokenRoute { command: Command, len: usize },
}

/// Replay `impulses` from `at`.
///
/// The result starts with `at` and holds the position after every impulse.
/// Compass letters move one cell, teleports land on their pad, and every
/// other letter keeps the unit in place.
pub fn trace_impulses(
    at: Coord,
    impulses: &[OrderImpulse],
    extent: &Extent,
    teleports: &TeleportTable,
) -> Result<Vec<Coord>, OrderTraceError> {
    let mut trace = Vec::with_capacity(impulses.len() + 1);
    trace.push(at);
    let mut here = at;
    for (position, impulse) in impulses.iter().enumerate() {
        here = match impulse {
            OrderImpulse::Teleport(label) => teleports
                .get(label)
                .copied()
                .ok_or_else(|| OrderTraceError::UnknownTeleport(label.clone()))?,
            other => match other.offset() {
                Some((dx, dy)) => here
                    .offset(dx, dy)
                    .filter(|next| extent.contains(*next))
                    .ok_or_else(|| OrderTraceError::OffBoard {
                        position,
                        impulse: other.to_string(),
                        from: here,
                    })?,
                None => here,
            },
        };
        trace.push(here);
    }
    Ok(trace)
}

/// Number of impulses that changed the unit's position.
pub fn move_cost(trace: &[Coord]) -> usize {
    trace.windows(2).filter(|pair| pair[0] != pair[1]).count()
}

/// Order letters for `command` walking `route`.
///
/// `route` runs from start to finish inclusive and must hold exactly one
/// cell per step plus the start.
pub fn order_impulses(
    command: Command,
    route: &[Coord],
) -> Result<Vec<OrderImpulse>, OrderTraceError> {
    let broken = || OrderTraceError::BrokenRoute {
        command,
        len: route.len(),
    };
    if route.len() != command.steps() as usize + 1 {
        return Err(broken());
    }

    let mut letters = Vec::with_capacity(command.impulses().len());
    let mut cells = route.windows(2);
    for impulse in command.impulses() {
        match impulse {
            Impulse::Dig => letters.push(OrderImpulse::Dig),
            Impulse::Step => {
                let pair = cells.next().ok_or_else(broken)?;
                letters.push(compass(pair[0], pair[1]).ok_or_else(broken)?);
            }
        }
    }
    Ok(letters)
}

fn compass(from: Coord, to: Coord) -> Option<OrderImpulse> {
    let dx = i64::from(to.x) - i64::from(from.x);
    let dy = i64::from(to.y) - i64::from(from.y);
    match (dx, dy) {
        (0, -1) => Some(OrderImpulse::North),
        (0, 1) => Some(OrderImpulse::South),
        (-1, 0) => Some(OrderImpulse::West),
        (1, 0) => Some(OrderImpulse::East),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_runtime::parse_impulses;

    fn extent() -> Extent {
        Extent {
            origin: Coord::new(1, 1),
            width: 37,
            height: 37,
        }
    }

    fn pads() -> TeleportTable {
        [("B".to_string(), Coord::new(19, 1))].into_iter().collect()
    }

    #[test]
    fn trace_follows_compass_and_teleports() {
        let impulses = parse_impulses("ESE..T(B)N").expect("parse");
        let err = trace_impulses(Coord::new(31, 7), &impulses, &extent(), &pads())
            .expect_err("north of row 1 is off the board");
        assert_eq!(
            err,
            OrderTraceError::OffBoard {
                position: 6,
                impulse: "N".to_string(),
                from: Coord::new(19, 1),
            }
        );

        let impulses = parse_impulses("ESE..T(B)S").expect("parse");
        let trace =
            trace_impulses(Coord::new(31, 7), &impulses, &extent(), &pads()).expect("trace");
        assert_eq!(trace.len(), impulses.len() + 1);
        assert_eq!(trace[3], Coord::new(33, 8));
        assert_eq!(trace[6], Coord::new(19, 1));
        assert_eq!(trace.last(), Some(&Coord::new(19, 2)));
        assert_eq!(move_cost(&trace), 5);
    }

    #[test]
    fn unknown_teleport_is_an_error() {
        let impulses = parse_impulses("T(Z)").expect("parse");
        let err = trace_impulses(Coord::new(2, 2), &impulses, &extent(), &pads())
            .expect_err("unknown pad");
        assert_eq!(err, OrderTraceError::UnknownTeleport("Z".to_string()));
    }

    #[test]
    fn digs_and_actions_cost_nothing() {
        let impulses = parse_impulses("DDH.U").expect("parse");
        let trace = trace_impulses(Coord::new(5, 5), &impulses, &extent(), &pads()).expect("trace");
        assert_eq!(move_cost(&trace), 0);
        assert!(trace.iter().all(|cell| *cell == Coord::new(5, 5)));
    }

    #[test]
    fn commands_become_letters_along_the_route() {
        let route = [Coord::new(4, 4), Coord::new(4, 3), Coord::new(5, 3)];
        let letters = order_impulses(Command::Sds, &route).expect("orders");
        let text: String = letters.iter().map(ToString::to_string).collect();
        assert_eq!(text, "NDE");

        let letters = order_impulses(Command::Ddd, &[Coord::new(4, 4)]).expect("orders");
        assert_eq!(letters, vec![OrderImpulse::Dig; 3]);

        let trace = trace_impulses(
            Coord::new(4, 4),
            &order_impulses(Command::Dss, &route).expect("orders"),
            &extent(),
            &pads(),
        )
        .expect("trace");
        assert_eq!(trace.last(), Some(&Coord::new(5, 3)));
    }

    #[test]
    fn routes_that_do_not_fit_are_rejected() {
        let err = order_impulses(Command::Sdd, &[Coord::new(1, 1)]).expect_err("too short");
        assert_eq!(
            err,
            OrderTraceError::BrokenRoute {
                command: Command::Sdd,
                len: 1
            }
        );
        let err = order_impulses(Command::Sdd, &[Coord::new(1, 1), Coord::new(3, 1)])
            .expect_err("not adjacent");
        assert!(matches!(err, OrderTraceError::BrokenRoute { .. }));
    }
}
