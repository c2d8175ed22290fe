use tracing::warn;

use super::types::{Occupancy, Reservation, Run, SlotGrid};

/// Splits the bookable part of `grid` into free and occupied runs for one
/// court and day.
///
/// Each reservation is placed at its start position and claims `slot_span`
/// positions, clipped at the terminator. Reservations are taken in start
/// order (input order among equal starts); one whose start is already
/// claimed by an earlier reservation is absorbed and gets no run. Rows that
/// do not start on a bookable label are skipped.
///
/// The result is ordered, disjoint and covers every bookable position, so
/// run lengths always sum to `grid.bookable_len()`.
pub fn partition<'a>(grid: &SlotGrid, reservations: &'a [Reservation]) -> Vec<Run<'a>> {
    let bookable = grid.bookable_len();
    let owners = claim_positions(grid, reservations);

    let mut runs = Vec::new();
    let mut position = 0;
    while position < bookable {
        let owner = owners[position];
        let len = owners[position..].iter().take_while(|o| **o == owner).count();
        runs.push(Run {
            start: position,
            len,
            occupancy: match owner {
                Some(idx) => Occupancy::Reserved(&reservations[idx]),
                None => Occupancy::Free,
            },
        });
        position += len;
    }
    runs
}

/// Index into `reservations` of the reservation holding each bookable position.
fn claim_positions(grid: &SlotGrid, reservations: &[Reservation]) -> Vec<Option<usize>> {
    let bookable = grid.bookable_len();
    let mut owners: Vec<Option<usize>> = vec![None; bookable];

    let mut starts: Vec<(usize, usize)> = reservations
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| match grid.position(r.start_slot()) {
            Some(position) if position < bookable => Some((position, idx)),
            _ => {
                warn!(reservation = %r.id, start = %r.start, "reservation does not start on a bookable slot, skipped");
                None
            }
        })
        .collect();
    starts.sort_by_key(|&(position, _)| position);

    for (position, idx) in starts {
        let reservation = &reservations[idx];
        if let Some(holder) = owners[position] {
            warn!(
                reservation = %reservation.id,
                overlaps = %reservations[holder].id,
                "overlapping reservation absorbed by earlier one"
            );
            continue;
        }
        let span = reservation.slot_span(grid.slot_minutes()) as usize;
        if span == 0 {
            warn!(reservation = %reservation.id, "reservation has no duration, skipped");
            continue;
        }
        let end = position.saturating_add(span);
        if end > bookable {
            warn!(reservation = %reservation.id, "reservation runs past closing time, clipped");
        }
        // Starts are sorted, so nothing after an unclaimed start is claimed yet.
        for owner in &mut owners[position..end.min(bookable)] {
            *owner = Some(idx);
        }
    }
    owners
}
