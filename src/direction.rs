/*!

Port-direction maps: the bijective direction-name <-> port-index tables
used by every non-table routing algorithm. Direction names stay
string-keyed at the public interface; internally they intern into the
small closed set of dense integers used by lookups.

*/

use std::collections::HashMap;

/// A bijective direction-name <-> port-index table. One instance is kept
/// for inports and a separate one for outports per `RoutingUnit`, mirroring
/// `m_inports_dirn2idx`/`m_inports_idx2dirn` (and the `outports` pair) in
/// the original source.
#[derive(Debug,Default)]
pub struct DirectionMap
{
	name_to_index: HashMap<Box<str>, usize>,
	index_to_name: Vec<Option<Box<str>>>,
}

impl DirectionMap
{
	pub fn new() -> DirectionMap
	{
		DirectionMap{ name_to_index: HashMap::new(), index_to_name: Vec::new() }
	}

	/// Register `name` as the direction reached through port `index`.
	pub fn add(&mut self, name: &str, index: usize)
	{
		if self.index_to_name.len() <= index
		{
			self.index_to_name.resize(index+1, None);
		}
		self.index_to_name[index] = Some(name.into());
		self.name_to_index.insert(name.into(), index);
	}

	pub fn index_of(&self, name: &str) -> Option<usize>
	{
		self.name_to_index.get(name).copied()
	}

	pub fn name_of(&self, index: usize) -> Option<&str>
	{
		self.index_to_name.get(index).and_then(|n| n.as_deref())
	}
}

/// The fixed, case-sensitive set of direction names used by the
/// topology-specific routing algorithms. `TABLE` routing
/// never consults these; they exist only for XY/Ring/XYZ.
pub mod names
{
	pub const LOCAL: &str = "Local";
	pub const NORTH: &str = "North";
	pub const SOUTH: &str = "South";
	pub const EAST: &str = "East";
	pub const WEST: &str = "West";
	pub const LEFT: &str = "Left";
	pub const RIGHT: &str = "Right";
	pub const UP: &str = "Up";
	pub const DOWN: &str = "Down";
	pub const FRONT: &str = "Front";
	pub const BACK: &str = "Back";
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn round_trip()
	{
		let mut m = DirectionMap::new();
		m.add(names::NORTH, 2);
		m.add(names::LOCAL, 0);
		assert_eq!(m.index_of(names::NORTH), Some(2));
		assert_eq!(m.name_of(0), Some(names::LOCAL));
		assert_eq!(m.index_of("Unregistered"), None);
	}
}
