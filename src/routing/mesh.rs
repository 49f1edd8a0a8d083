/*!

Deterministic dimension-order (XY) routing for a 2D mesh. Ground truth:
`RoutingUnit::outportComputeXY` in the original source, preserved here
including its turn-restriction assertions (these encode
real topology invariants and a violation indicates an upstream bug, not a
recoverable condition).

*/

use crate::direction::names;
use crate::error::RoutingError;

/// Compute the next outport for a packet travelling from `my_id` to
/// `dest_id` in a `num_cols`-wide mesh, given the direction it arrived from.
/// X is resolved before Y, exactly as in the original: a packet only ever
/// turns once, at the column of its destination.
pub fn outport_compute_xy(in_direction: &str, my_id: usize, dest_id: usize, num_cols: usize) -> Result<&'static str, RoutingError>
{
	let my_x = (my_id % num_cols) as i64;
	let my_y = (my_id / num_cols) as i64;
	let dest_x = (dest_id % num_cols) as i64;
	let dest_y = (dest_id / num_cols) as i64;

	let x_hops = (dest_x - my_x).abs();
	let y_hops = (dest_y - my_y).abs();
	let x_dirn = dest_x >= my_x;
	let y_dirn = dest_y >= my_y;

	if x_hops == 0 && y_hops == 0
	{
		return Err(RoutingError::ZeroHop);
	}

	if x_hops > 0
	{
		if x_dirn
		{
			check_turn(in_direction, &[names::LOCAL, names::WEST])?;
			Ok(names::EAST)
		}
		else
		{
			check_turn(in_direction, &[names::LOCAL, names::EAST])?;
			Ok(names::WEST)
		}
	}
	else
	{
		if y_dirn
		{
			// "Local" or "South" or "West" or "East": any inport except the
			// opposite Y direction.
			check_not_turn(in_direction, names::NORTH)?;
			Ok(names::NORTH)
		}
		else
		{
			// "Local" or "North" or "West" or "East".
			check_not_turn(in_direction, names::SOUTH)?;
			Ok(names::SOUTH)
		}
	}
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

fn check_not_turn(in_direction: &str, forbidden: &'static str) -> Result<(), RoutingError>
{
	if in_direction != forbidden
	{
		Ok(())
	}
	else
	{
		Err(RoutingError::TurnViolation{ expected: "anything but the opposite Y direction", inport_direction: in_direction.to_string() })
	}
}
