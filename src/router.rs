/*!

A single router: the input/output units, routing unit and switch allocator
that belong to it, wired together for one clock edge. Ground truth for the
operation names: the `Router`/`InputOutput` interaction in the original
source's `input_output.rs`.

*/

use std::collections::BTreeSet;

use rand::rngs::StdRng;

use crate::allocator::{Grant, SwitchAllocator};
use crate::direction::names;
use crate::flit::{Flit, PipelineStage, Time};
use crate::routing::{self, RouteDecision, RoutingAlgorithm, RoutingUnit};
use crate::vc::{CreditReturn, InputUnit, OutputUnit};

/// A single router in the network. Owns one `InputUnit`/`OutputUnit` per
/// physical port (index-aligned: port `p`'s input and output share a
/// direction), a `RoutingUnit`, and a `SwitchAllocator`.
#[derive(Debug)]
pub struct Router
{
	id: usize,
	inputs: Vec<InputUnit>,
	outputs: Vec<OutputUnit>,
	routing_unit: RoutingUnit,
	switch_allocator: SwitchAllocator,
	/// Future ticks this router has already scheduled a wakeup for, so
	/// `schedule_wakeup` stays idempotent.
	scheduled_wakeups: BTreeSet<Time>,
}

impl Router
{
	pub fn new(id: usize, num_ports: usize, num_vcs: usize, vcs_per_vnet: usize, num_vnets: usize, num_nodes: usize, initial_credit: i32) -> Router
	{
		Router{
			id,
			inputs: (0..num_ports).map(|_| InputUnit::new("Unknown", num_vcs)).collect(),
			outputs: (0..num_ports).map(|_| OutputUnit::new("Unknown", num_vcs, vcs_per_vnet, initial_credit)).collect(),
			routing_unit: RoutingUnit::new(num_vnets, num_nodes),
			switch_allocator: SwitchAllocator::new(num_ports, num_ports, num_vnets, vcs_per_vnet),
			scheduled_wakeups: BTreeSet::new(),
		}
	}

	pub fn get_id(&self) -> usize
	{
		self.id
	}

	/// Bind the direction name for port `port`, shared by its input and
	/// output unit, and register it with the routing unit's direction maps.
	pub fn set_port_direction(&mut self, port: usize, in_name: &str, out_name: &str)
	{
		self.inputs[port].set_direction(in_name);
		self.outputs[port].set_direction(out_name);
		self.routing_unit.add_in_direction(in_name, port);
		self.routing_unit.add_out_direction(out_name, port);
	}

	pub fn get_port_direction_name(&self, port: usize) -> &str
	{
		self.outputs[port].get_direction()
	}

	pub fn input_unit(&self, port: usize) -> &InputUnit
	{
		&self.inputs[port]
	}
	pub fn input_unit_mut(&mut self, port: usize) -> &mut InputUnit
	{
		&mut self.inputs[port]
	}
	pub fn output_unit(&self, port: usize) -> &OutputUnit
	{
		&self.outputs[port]
	}
	pub fn output_unit_mut(&mut self, port: usize) -> &mut OutputUnit
	{
		&mut self.outputs[port]
	}
	pub fn routing_unit(&self) -> &RoutingUnit
	{
		&self.routing_unit
	}
	pub fn routing_unit_mut(&mut self) -> &mut RoutingUnit
	{
		&mut self.routing_unit
	}

	/// `already_scheduled(tick)`.
	pub fn already_scheduled(&self, tick: Time) -> bool
	{
		self.scheduled_wakeups.contains(&tick)
	}

	/// `schedule_wakeup(cycles)`: request a wakeup `cycles` after `now`,
	/// unless one is already pending for that tick.
	pub fn schedule_wakeup(&mut self, now: Time, cycles: Time)
	{
		self.scheduled_wakeups.insert(now + cycles);
	}

	/// Apply a received flit to virtual channel `vc` of input `port`
	/// (`vc` is assumed already bound by VA for a fresh packet), routing it
	/// via `algorithm` if it is a head flit, and tag it for the SA stage.
	/// `ordered` is this flit's vnet's ordering flag, consulted only by
	/// TABLE routing's tie-break.
	pub fn receive_flit(
		&mut self, port: usize, vc: usize, mut flit: Flit, algorithm: RoutingAlgorithm,
		dest_table_vnet_dest: Option<&crate::flit::NetDest>, ordered: bool,
		num_cols: usize, num_routers: usize,
		num_xs: usize, num_ys: usize, num_zs: usize,
		rng: &mut StdRng,
	)
	{
		if flit.kind.is_head()
		{
			if flit.route.dest_router == self.id
			{
				// Already at the destination router: deliver straight to
				// the local network interface rather than invoking a
				// topology algorithm that assumes hops remain.
				let local = self.local_port();
				flit.outport = Some(local);
				self.inputs[port].grant_outport(vc, local);
				if algorithm == RoutingAlgorithm::Xyz
				{
					// Mirrors `outportComputeXYZ`'s own `dest == my_id` case:
					// `{(local,R1),(local,R2)}`, so SA-I's torus-head branch
					// (which reads `get_outports`, not the outport field
					// above) has a non-empty candidate set to admit.
					self.inputs[port].set_torus_candidates(vc, vec![
						crate::routing::OutportHalf{ port: local, first_half: true },
						crate::routing::OutportHalf{ port: local, first_half: false },
					]);
				}
			}
			else
			{
				let in_dirn = self.inputs[port].get_direction().to_string();
				let decision = self.compute_route(&in_dirn, &flit, algorithm, dest_table_vnet_dest, ordered, num_cols, num_routers, num_xs, num_ys, num_zs, rng);
				match decision
				{
					RouteDecision::Single(outport) =>
					{
						flit.outport = Some(outport);
						self.inputs[port].grant_outport(vc, outport);
					},
					RouteDecision::Candidates(candidates) =>
					{
						// Adaptive torus routing: the outport binding is
						// left open across the candidate set; SA-I/SA-II
						// resolve it via `InputUnit::get_outports`.
						flit.outport = candidates.first().map(|c| c.port);
						self.inputs[port].set_torus_candidates(vc, candidates);
					},
				}
			}
		}
		else
		{
			// Body/tail flits carry no route of their own; in wormhole mode
			// the switch allocator's SA-I stage reads a flit's outport
			// straight off the flit rather than the VC, so a body/tail flit
			// inherits whatever outport the head already bound on this VC.
			flit.outport = self.inputs[port].get_outport(vc);
		}
		flit.advance_stage(PipelineStage::Sa);
		self.inputs[port].vc_mut(vc).push(flit);
	}

	fn compute_route(
		&self, in_dirn: &str, flit: &Flit, algorithm: RoutingAlgorithm,
		dest_table_vnet_dest: Option<&crate::flit::NetDest>, ordered: bool,
		num_cols: usize, num_routers: usize,
		num_xs: usize, num_ys: usize, num_zs: usize,
		rng: &mut StdRng,
	) -> RouteDecision
	{
		match algorithm
		{
			RoutingAlgorithm::Table =>
			{
				let dest = dest_table_vnet_dest.expect("TABLE routing requires a destination NetDest");
				routing::lookup_table_route(&self.routing_unit, flit.vnet, dest, ordered, rng)
					.unwrap_or_else(|e| panic!("{}", e.message()))
			},
			RoutingAlgorithm::Xy =>
			{
				let dest_id = flit.route.dest_router;
				let out = routing::mesh::outport_compute_xy(in_dirn, self.id, dest_id, num_cols)
					.unwrap_or_else(|e| panic!("{}", e.message()));
				RouteDecision::Single(self.routing_unit.out_dirs().index_of(out).expect("unregistered direction"))
			},
			RoutingAlgorithm::Ring =>
			{
				let dest_id = flit.route.dest_router;
				let out = routing::ring::outport_compute_ring(in_dirn, self.id, dest_id, num_routers)
					.unwrap_or_else(|e| panic!("{}", e.message()));
				RouteDecision::Single(self.routing_unit.out_dirs().index_of(out).expect("unregistered direction"))
			},
			RoutingAlgorithm::Xyz =>
			{
				let dest_id = flit.route.dest_router;
				let out_dirs = self.routing_unit.out_dirs();
				let candidates = routing::torus::outport_compute_xyz(
					|name| out_dirs.index_of(name),
					self.id, dest_id, num_xs, num_ys, num_zs,
					flit.crossed_x, flit.crossed_y, flit.crossed_z,
				).unwrap_or_else(|e| panic!("{}", e.message()));
				RouteDecision::Candidates(candidates)
			},
			RoutingAlgorithm::Custom =>
			{
				routing::custom_placeholder().unwrap_or_else(|e| panic!("{}", e.message()))
			},
		}
	}

	/// One allocator cycle. Returns the grants made this tick so the
	/// network harness can perform the actual crossbar/link traversal
	/// (popping the flit, enqueueing it on the downstream router, issuing
	/// the credit).
	pub fn clock_edge(&mut self, tick: Time, is_vnet_ordered: impl Fn(usize) -> bool, is_torus: bool, wormhole: bool, rng: &mut StdRng) -> Vec<Grant>
	{
		self.switch_allocator.wakeup(&mut self.inputs, &mut self.outputs, is_vnet_ordered, is_torus, wormhole, rng, tick)
	}

	/// Pop the switch-traversal winner for `grant` off its input VC, for
	/// the harness to forward downstream.
	pub fn grant_switch(&mut self, grant: &Grant) -> Flit
	{
		self.inputs[grant.inport].get_top_flit(grant.invc)
	}

	pub fn drain_credit_returns(&mut self, port: usize) -> Vec<CreditReturn>
	{
		self.inputs[port].drain_credit_returns()
	}

	/// Drain pending credit returns across every input port, tagged with
	/// the port they were emitted on (the port a credit travels back out
	/// of towards the upstream router).
	pub fn drain_credit_returns_all(&mut self) -> Vec<(usize, CreditReturn)>
	{
		let mut all = Vec::new();
		for port in 0..self.inputs.len()
		{
			for r in self.inputs[port].drain_credit_returns()
			{
				all.push((port, r));
			}
		}
		all
	}

	pub fn check_for_wakeup(&self, tick: Time) -> bool
	{
		self.switch_allocator.check_for_wakeup(&self.inputs, tick)
	}

	pub fn reset_stats(&mut self)
	{
		self.switch_allocator.reset_stats();
	}

	/// `get_local_port()` convenience: every router registers a "Local"
	/// direction for its network-interface-facing port.
	pub fn local_port(&self) -> usize
	{
		self.routing_unit.out_dirs().index_of(names::LOCAL).expect("router has no Local port registered")
	}
}
