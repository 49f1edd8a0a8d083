/*!

Deterministic shortest-direction routing for a unidirectional-link ring.
Ground truth: `RoutingUnit::outportComputeRing` in the original source.

The original branches first on whether `dest_id > my_id` or `dest_id <
my_id` (numerically, on router ids around the ring), and only then compares
the relevant distance against `num_nodes/2` — not a single symmetric
comparison between the clockwise and counter-clockwise distances. Both
branches use `<=`, so an exact half-ring tie resolves to `Right` when
`dest_id > my_id` but to `Left` when `dest_id < my_id`: the same physical
separation ties in opposite directions depending on numeric id order, which
has nothing to do with ring topology. This is preserved verbatim rather
than replaced with a symmetric distance comparison.

*/

use crate::direction::names;
use crate::error::RoutingError;

pub fn outport_compute_ring(in_direction: &str, my_id: usize, dest_id: usize, num_routers: usize) -> Result<&'static str, RoutingError>
{
	if my_id == dest_id
	{
		return Err(RoutingError::ZeroHop);
	}

	let num_routers = num_routers as i64;
	let my_id = my_id as i64;
	let dest_id = dest_id as i64;

	let outport_dirn = if dest_id > my_id
	{
		if (dest_id - my_id) <= (num_routers / 2)
		{
			names::RIGHT
		}
		else
		{
			names::LEFT
		}
	}
	else
	{
		if (my_id - dest_id) <= (num_routers / 2)
		{
			names::LEFT
		}
		else
		{
			names::RIGHT
		}
	};

	let allowed = if outport_dirn == names::RIGHT { [names::LOCAL, names::LEFT] } else { [names::LOCAL, names::RIGHT] };
	check_turn(in_direction, &allowed)?;
	Ok(outport_dirn)
}

fn check_turn(in_direction: &str, allowed: &[&'static str]) -> Result<(), RoutingError>
{
	if allowed.contains(&in_direction)
	{
		Ok(())
	}
	else
	{
		Err(RoutingError::TurnViolation{ expected: allowed[0], inport_direction: in_direction.to_string() })
	}
}
