/*!

The minimal network harness the routing unit and switch allocator need to
operate against: an arena of routers, the shared RNG, and the topology
parameters (a standalone routing/allocation core
needs a toy network to be tested at all — the surrounding simulator kernel
itself is out of scope).

*/

use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::allocator::Grant;
use crate::config::NetworkConfig;
use crate::flit::{Flit, Time};
use crate::router::Router;
use crate::routing::RoutingAlgorithm;
use crate::vc::CreditReturn;

/// Topology queries the routing unit and allocator need but do not own
/// themselves, mirroring the small subset of `GarnetNetwork`/`Topology`
/// accessors `RoutingUnit.cc` reaches through `m_router->get_net_ptr()`.
pub trait NetworkTopologyInfo
{
	fn num_rows(&self) -> usize;
	fn num_cols(&self) -> usize;
	fn num_xs(&self) -> usize;
	fn num_ys(&self) -> usize;
	fn num_zs(&self) -> usize;
	fn num_routers(&self) -> usize;
	fn routing_algorithm(&self) -> RoutingAlgorithm;
	fn is_vnet_ordered(&self, vnet: usize) -> bool;
}

/// A small arena of routers plus the global configuration and RNG they
/// share. This is a convenience harness, not a full simulator: it owns the
/// routers but runs no event queue of its own — callers drive it one
/// `clock_edge`/delivery step at a time, as the tests in this crate do.
pub struct Network
{
	config: NetworkConfig,
	routers: Vec<Router>,
	rng: StdRng,
}

impl Network
{
	pub fn new(config: NetworkConfig, seed: u64) -> Network
	{
		let num_ports = config.num_ports_per_router;
		let num_vcs = config.num_vnets*config.vcs_per_vnet;
		let routers = (0..config.num_routers)
			.map(|id| Router::new(id, num_ports, num_vcs, config.vcs_per_vnet, config.num_vnets, config.num_routers, config.initial_credit))
			.collect();
		Network{ config, routers, rng: StdRng::seed_from_u64(seed) }
	}

	pub fn router(&self, id: usize) -> &Router
	{
		&self.routers[id]
	}
	pub fn router_mut(&mut self, id: usize) -> &mut Router
	{
		&mut self.routers[id]
	}
	pub fn num_routers(&self) -> usize
	{
		self.routers.len()
	}
	pub fn rng_mut(&mut self) -> &mut StdRng
	{
		&mut self.rng
	}
	pub fn config(&self) -> &NetworkConfig
	{
		&self.config
	}

	/// Inject `flit` directly onto input VC `vc` of `(router, port)`,
	/// routing it (for head flits) with the network's configured algorithm
	/// and topology parameters. A convenience for test fixtures that would
	/// otherwise need to pass every topology parameter by hand at each call
	/// site. A freshly injected packet has crossed no torus dateline yet;
	/// `Flit::new` already defaults `crossed_x/y/z` to `false`.
	pub fn inject(&mut self, router: usize, port: usize, vc: usize, flit: Flit)
	{
		let algorithm = self.config.routing_algorithm;
		let ordered = self.config.vnet_ordered.get(flit.vnet).copied().unwrap_or(false);
		let num_cols = self.config.num_cols;
		let num_routers = self.routers.len();
		let num_xs = self.config.num_xs;
		let num_ys = self.config.num_ys;
		let num_zs = self.config.num_zs;
		let dest = flit.route.net_dest.clone();
		self.routers[router].receive_flit(
			port, vc, flit, algorithm, Some(&dest), ordered,
			num_cols, num_routers, num_xs, num_ys, num_zs,
			&mut self.rng,
		);
	}

	/// Run one switch-allocator cycle on every router and perform the
	/// crossbar/link traversal for every grant: pop the winning flit, move
	/// it onto the downstream router's matching input VC (or drop it at
	/// its destination's local port), and issue the credit back upstream.
	/// Returns the flits that reached their destination this tick.
	pub fn clock_tick(&mut self, tick: Time) -> Vec<Flit>
	{
		let mut arrivals = Vec::new();
		let num_routers = self.routers.len();
		// Pulled out as locals rather than read through a closure over
		// `self.config`: this edition's closures capture whole variables, not
		// individual fields, which would otherwise hold `self` borrowed for
		// the rest of this call alongside the `&mut self.routers`/`self.rng`
		// this same statement needs.
		let vnet_ordered = self.config.vnet_ordered.clone();
		let is_torus = self.config.is_torus();
		let wormhole = self.config.wormhole;
		let mut all_grants: Vec<(usize, Vec<Grant>)> = Vec::with_capacity(num_routers);
		for id in 0..num_routers
		{
			let is_vnet_ordered = |vnet: usize| vnet_ordered.get(vnet).copied().unwrap_or(false);
			let grants = self.routers[id].clock_edge(tick, is_vnet_ordered, is_torus, wormhole, &mut self.rng);
			all_grants.push((id, grants));
		}

		for (id, grants) in all_grants
		{
			for grant in grants
			{
				let mut flit = self.routers[id].grant_switch(&grant);
				// In wormhole mode a VC is shared by every flit of a packet
				// and frees only once the tail passes; outside wormhole
				// mode, this crate treats each admitted flit as its own
				// unit of VC ownership, so it frees immediately.
				let vc_free = !self.config.wormhole || flit.kind.is_tail();
				let destination_router = flit.route.dest_router;

				if destination_router == id && grant.outport == self.routers[id].local_port()
				{
					arrivals.push(flit);
				}
				else
				{
					if self.config.is_torus() && !grant.first_half
					{
						// This hop spent (or had already spent) its R1
						// budget on the dimension it just advanced; commit
						// to R2 for the rest of this dimension's journey.
						match self.routers[id].get_port_direction_name(grant.outport)
						{
							crate::direction::names::FRONT | crate::direction::names::BACK => flit.crossed_x = true,
							crate::direction::names::RIGHT | crate::direction::names::LEFT => flit.crossed_y = true,
							crate::direction::names::UP | crate::direction::names::DOWN => flit.crossed_z = true,
							_ => (),
						}
					}
					let downstream = self.downstream_router(id, grant.outport);
					let downstream_inport = self.downstream_inport(id, grant.outport);
					let algorithm = self.config.routing_algorithm;
					let ordered = self.config.vnet_ordered.get(flit.vnet).copied().unwrap_or(false);
					let num_cols = self.config.num_cols;
					let num_routers = self.routers.len();
					let num_xs = self.config.num_xs;
					let num_ys = self.config.num_ys;
					let num_zs = self.config.num_zs;
					let dest = flit.route.net_dest.clone();
					self.routers[downstream].receive_flit(
						downstream_inport, grant.outvc, flit, algorithm, Some(&dest), ordered,
						num_cols, num_routers, num_xs, num_ys, num_zs,
						&mut self.rng,
					);
				}

				if vc_free
				{
					self.routers[id].input_unit_mut(grant.inport).vc_mut(grant.invc).set_vc_idle(tick);
				}
				self.routers[id].input_unit_mut(grant.inport).increment_credit(grant.invc, vc_free, tick);
			}

			let returns: Vec<(usize, CreditReturn)> = self.routers[id].drain_credit_returns_all();
			for (inport, r) in returns
			{
				if inport == self.routers[id].local_port()
				{
					// The network-interface-facing port has no upstream
					// router on the other end of it to credit.
					continue;
				}
				let (upstream, upstream_outport) = self.upstream_of(id, inport);
				trace!("credit return: router {} port {} vc {} (vc_free={}) -> router {} outport {}", id, inport, r.vc, r.vc_free, upstream, upstream_outport);
				self.routers[upstream].output_unit_mut(upstream_outport).apply_credit(r.vc, r.vc_free, self.config.initial_credit);
			}
		}

		arrivals
	}

	/// Resolve which router sits downstream of `(router, outport)`.
	fn downstream_router(&self, router: usize, outport: usize) -> usize
	{
		self.config.neighbor(router, outport)
	}
	fn downstream_inport(&self, router: usize, outport: usize) -> usize
	{
		self.config.reverse_port(router, outport)
	}
	/// Credits travel back out across the same physical link a flit
	/// arrived on; this is simply `downstream_router`/`downstream_inport`
	/// run in reverse, from the receiving router's inport.
	fn upstream_of(&self, router: usize, inport: usize) -> (usize, usize)
	{
		(self.config.neighbor(router, inport), self.config.reverse_port(router, inport))
	}
}

impl NetworkTopologyInfo for Network
{
	fn num_rows(&self) -> usize
	{
		self.config.num_rows
	}
	fn num_cols(&self) -> usize
	{
		self.config.num_cols
	}
	fn num_xs(&self) -> usize
	{
		self.config.num_xs
	}
	fn num_ys(&self) -> usize
	{
		self.config.num_ys
	}
	fn num_zs(&self) -> usize
	{
		self.config.num_zs
	}
	fn num_routers(&self) -> usize
	{
		self.routers.len()
	}
	fn routing_algorithm(&self) -> RoutingAlgorithm
	{
		self.config.routing_algorithm
	}
	fn is_vnet_ordered(&self, vnet: usize) -> bool
	{
		self.config.vnet_ordered.get(vnet).copied().unwrap_or(false)
	}
}
