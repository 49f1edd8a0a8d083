/*!

Plain configuration structs for the router and the network test harness.

The original source builds configuration from a small grammar
(`config_parser`/`ConfigurationValue`) aimed at describing an entire
simulation campaign — traffic patterns, output policies, measurement
windows — none of which this crate's scope includes. Non-goals
explicitly exclude "configuration file parsing ... specific to the full
simulator", so here configuration is just the handful of plain, validated
builder structs the routing unit and switch allocator themselves need.

*/

use crate::routing::RoutingAlgorithm;

/// A single bidirectional physical link between two router ports, used by
/// `Network` to resolve where a grant's flit (and, later, its credit) goes.
#[derive(Clone,Copy,Debug)]
pub struct Link
{
	pub router_a: usize,
	pub port_a: usize,
	pub router_b: usize,
	pub port_b: usize,
}

/// Everything the toy `Network` harness and the routers it owns need to be
/// built: port/VC counts, the chosen routing algorithm, per-vnet ordering
/// and wormhole flags, and the physical topology as an explicit link list.
#[derive(Clone,Debug)]
pub struct NetworkConfig
{
	pub num_routers: usize,
	pub num_ports_per_router: usize,
	pub num_vnets: usize,
	pub vcs_per_vnet: usize,
	pub initial_credit: i32,
	pub routing_algorithm: RoutingAlgorithm,
	pub wormhole: bool,
	/// One entry per vnet: whether packets on it must be delivered in
	/// issue order (the head-of-line rule).
	pub vnet_ordered: Vec<bool>,
	pub num_rows: usize,
	pub num_cols: usize,
	pub num_xs: usize,
	pub num_ys: usize,
	pub num_zs: usize,
	pub links: Vec<Link>,
}

impl NetworkConfig
{
	pub fn is_torus(&self) -> bool
	{
		self.routing_algorithm == RoutingAlgorithm::Xyz
	}

	/// Find the physical link touching `(router, port)`, from either side.
	fn link_at(&self, router: usize, port: usize) -> &Link
	{
		self.links.iter()
			.find(|l| (l.router_a == router && l.port_a == port) || (l.router_b == router && l.port_b == port))
			.unwrap_or_else(|| panic!("no link registered at router {} port {}", router, port))
	}

	/// The router on the far end of `(router, port)`.
	pub fn neighbor(&self, router: usize, port: usize) -> usize
	{
		let l = self.link_at(router, port);
		if l.router_a == router && l.port_a == port { l.router_b } else { l.router_a }
	}

	/// The port on the far end of `(router, port)` — the inport a flit
	/// leaving on `(router, port)` arrives on.
	pub fn reverse_port(&self, router: usize, port: usize) -> usize
	{
		let l = self.link_at(router, port);
		if l.router_a == router && l.port_a == port { l.port_b } else { l.port_a }
	}
}

/// Builder for `NetworkConfig`, in the spirit of the `*BuilderArgument`
/// structs the original source threads through its own `new_*` functions.
pub struct NetworkConfigBuilder
{
	config: NetworkConfig,
}

impl NetworkConfigBuilder
{
	pub fn new(num_routers: usize, num_ports_per_router: usize, num_vnets: usize, vcs_per_vnet: usize) -> NetworkConfigBuilder
	{
		NetworkConfigBuilder{
			config: NetworkConfig{
				num_routers,
				num_ports_per_router,
				num_vnets,
				vcs_per_vnet,
				initial_credit: 2,
				routing_algorithm: RoutingAlgorithm::Table,
				wormhole: true,
				vnet_ordered: vec![false; num_vnets],
				num_rows: 1,
				num_cols: num_routers,
				num_xs: num_routers,
				num_ys: 1,
				num_zs: 1,
				links: Vec::new(),
			},
		}
	}

	pub fn initial_credit(mut self, credit: i32) -> Self
	{
		self.config.initial_credit = credit;
		self
	}
	pub fn routing_algorithm(mut self, algorithm: RoutingAlgorithm) -> Self
	{
		self.config.routing_algorithm = algorithm;
		self
	}
	pub fn wormhole(mut self, wormhole: bool) -> Self
	{
		self.config.wormhole = wormhole;
		self
	}
	pub fn vnet_ordered(mut self, vnet: usize, ordered: bool) -> Self
	{
		self.config.vnet_ordered[vnet] = ordered;
		self
	}
	pub fn mesh_dims(mut self, num_rows: usize, num_cols: usize) -> Self
	{
		self.config.num_rows = num_rows;
		self.config.num_cols = num_cols;
		self
	}
	pub fn torus_dims(mut self, num_xs: usize, num_ys: usize, num_zs: usize) -> Self
	{
		self.config.num_xs = num_xs;
		self.config.num_ys = num_ys;
		self.config.num_zs = num_zs;
		self
	}
	pub fn link(mut self, router_a: usize, port_a: usize, router_b: usize, port_b: usize) -> Self
	{
		self.config.links.push(Link{ router_a, port_a, router_b, port_b });
		self
	}

	pub fn finish(self) -> NetworkConfig
	{
		self.config
	}
}
