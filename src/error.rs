/*!

Errors raised by the routing unit and switch allocator.

These are plain enums carrying just enough data to build a message; there
is no `std::error::Error`/`Display` impl because every variant here
corresponds to a fatal condition that is reported once, at the panic site,
and never propagated or matched on by a caller. Expected back-pressure (no
free VC, no credit, ordering block) is *not* represented here: it is
encoded as `false`/`None` return values instead.

*/

/// Fatal conditions raised while computing an outport for a flit.
#[derive(Debug)]
pub enum RoutingError
{
	/// `lookup_routing_table` found no candidate link for the given
	/// `(vnet, net_dest)`. Corresponds to gem5's
	/// `fatal("Fatal Error:: No Route exists from this Router.")`.
	NoRoute{ vnet: usize },
	/// The `CUSTOM` routing algorithm placeholder was invoked.
	CustomPlaceholder,
	/// A turn-restriction assertion failed in XY or Ring routing: the
	/// `inport_direction` seen is incompatible with the outport direction
	/// about to be taken, indicating an upstream routing or topology bug.
	TurnViolation{ expected: &'static str, inport_direction: String },
	/// `outport_compute` for XY saw `x_hops == 0 && y_hops == 0`, or Ring
	/// saw `my_id == dest_id`; the caller should have filtered this case.
	ZeroHop,
	/// A 3D-torus candidate set was empty, or exceeded the maximum of 4
	/// admissible `(outport, first_half)` pairs.
	InvalidCandidateSet{ len: usize },
}

impl RoutingError
{
	/// Render a human-readable message, used at `panic!` call sites.
	pub fn message(&self) -> String
	{
		match self
		{
			RoutingError::NoRoute{vnet} => format!("No route exists from this router for vnet {}", vnet),
			RoutingError::CustomPlaceholder => "CUSTOM routing algorithm invoked; it is a reserved placeholder and must not be reached in a conformant build".to_string(),
			RoutingError::TurnViolation{expected,inport_direction} => format!("turn restriction violated: expected inport direction {}, got {}", expected, inport_direction),
			RoutingError::ZeroHop => "routing invoked with zero hops remaining in every dimension; caller should have filtered this case".to_string(),
			RoutingError::InvalidCandidateSet{len} => format!("3D-torus candidate set has {} entries, expected 1..=4", len),
		}
	}
}

/// Fatal conditions raised while performing switch allocation.
#[derive(Debug)]
pub enum AllocatorError
{
	/// `vc_allocate` found no free (or credited) output VC, even though
	/// SA-I should have guaranteed availability before making the request.
	NoVcAvailable{ outport: usize },
	/// A flit reached SA with an unset outport.
	MissingOutport,
}

impl AllocatorError
{
	pub fn message(&self) -> String
	{
		match self
		{
			AllocatorError::NoVcAvailable{outport} => format!("vc_allocate found no available output VC at outport {}; SA-I should not have granted this request", outport),
			AllocatorError::MissingOutport => "flit reached SA stage with no outport bound".to_string(),
		}
	}
}
