/*!

The switch allocator: separable two-stage (SA-I/SA-II) arbitration for the
router crossbar, plus VC allocation and the credit-aware admission checks
that guard both. Ground truth: `SwitchAllocator.cc` in the original source.

*/

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;

use crate::error::AllocatorError;
use crate::flit::{PipelineStage, Time};
use crate::routing::OutportHalf;
use crate::vc::{InputUnit, OutputUnit};

/// The outcome of a cycle's arbitration for one input VC: it won both
/// stages and may traverse the crossbar this cycle.
#[derive(Clone,Copy,Debug)]
pub struct Grant
{
	pub inport: usize,
	pub invc: usize,
	pub outport: usize,
	pub outvc: usize,
	pub first_half: bool,
}

/// Per-router switch allocator state: round-robin pointers and activity
/// counters. Holds no flit/VC storage of its own — that lives in the
/// `InputUnit`/`OutputUnit`s it is handed each cycle, mirroring
/// `SwitchAllocator` holding only a `Router *` back-pointer in the original.
#[derive(Debug)]
pub struct SwitchAllocator
{
	num_inports: usize,
	num_outports: usize,
	num_vnets: usize,
	vcs_per_vnet: usize,
	/// `m_round_robin_inport`: the next inport favored for each outport's
	/// SA-II arbitration.
	round_robin_inport: Vec<usize>,
	/// `m_round_robin_invc`: the next VC favored for each inport's SA-I
	/// arbitration.
	round_robin_invc: Vec<usize>,
	input_arbiter_activity: u64,
	output_arbiter_activity: u64,
}

impl SwitchAllocator
{
	/// `init()`.
	pub fn new(num_inports: usize, num_outports: usize, num_vnets: usize, vcs_per_vnet: usize) -> SwitchAllocator
	{
		SwitchAllocator{
			num_inports,
			num_outports,
			num_vnets,
			vcs_per_vnet,
			round_robin_inport: vec![0; num_outports],
			round_robin_invc: vec![0; num_inports],
			input_arbiter_activity: 0,
			output_arbiter_activity: 0,
		}
	}

	pub fn reset_stats(&mut self)
	{
		self.input_arbiter_activity = 0;
		self.output_arbiter_activity = 0;
	}
	pub fn input_arbiter_activity(&self) -> u64
	{
		self.input_arbiter_activity
	}
	pub fn output_arbiter_activity(&self) -> u64
	{
		self.output_arbiter_activity
	}

	pub fn get_vnet(&self, vc: usize) -> usize
	{
		let vnet = vc / self.vcs_per_vnet;
		debug_assert!(vnet < self.num_vnets);
		vnet
	}

	/// One full allocation cycle: SA-I followed by SA-II. Mirrors
	/// `SwitchAllocator::wakeup`. `is_vnet_ordered` is the per-vnet ordering
	/// parameter; `is_torus`/`wormhole` select the admission-check and
	/// VC-allocation variants the original branches on; `rng` backs
	/// `torus_send_allowed`'s random pick among equally legal candidates.
	pub fn wakeup(
		&mut self,
		inputs: &mut [InputUnit], outputs: &mut [OutputUnit],
		is_vnet_ordered: impl Fn(usize) -> bool,
		is_torus: bool, wormhole: bool,
		rng: &mut StdRng,
		tick: Time,
	) -> Vec<Grant>
	{
		let (port_requests, vc_winners) = self.arbitrate_inports(inputs, outputs, &is_vnet_ordered, is_torus, wormhole, rng, tick);
		self.arbitrate_outports(inputs, outputs, port_requests, vc_winners, is_torus, wormhole)
	}

	/// SA-I: independent per-inport arbiters, each picking at most one
	/// winning VC this cycle by scanning its own VCs round-robin starting at
	/// `round_robin_invc[inport]`. Exactly one `(outport, invc)` request is
	/// placed per inport — never two, even if two different ready VCs on the
	/// same inport target two different outports — since only one flit can
	/// leave an input port's crossbar connection per cycle.
	fn arbitrate_inports(
		&mut self,
		inputs: &mut [InputUnit], outputs: &[OutputUnit],
		is_vnet_ordered: &impl Fn(usize) -> bool,
		is_torus: bool, wormhole: bool,
		rng: &mut StdRng,
		tick: Time,
	) -> (Vec<Option<usize>>, Vec<Option<usize>>)
	{
		let mut port_requests: Vec<Option<usize>> = vec![None; self.num_inports];
		let mut vc_winners: Vec<Option<usize>> = vec![None; self.num_inports];

		for inport in 0..self.num_inports
		{
			let num_vcs = inputs[inport].num_vcs();
			for step in 0..num_vcs
			{
				let invc = (self.round_robin_invc[inport] + step) % num_vcs;

				if !inputs[inport].need_stage(invc, PipelineStage::Sa, tick)
				{
					continue;
				}

				let (make_request, outport) = if !is_torus
				{
					if wormhole
					{
						let outport = inputs[inport].peek_top_flit(invc).outport
							.unwrap_or_else(|| panic!("{}", AllocatorError::MissingOutport.message()));
						inputs[inport].grant_outport(invc, outport);
						inputs[inport].clear_outvc(invc);
					}
					let outport = inputs[inport].get_outport(invc)
						.unwrap_or_else(|| panic!("{}", AllocatorError::MissingOutport.message()));
					let outvc = inputs[inport].get_outvc(invc);
					let ok = self.send_allowed(inputs, outputs, inport, invc, outport, outvc, wormhole, None, is_vnet_ordered, tick);
					(ok, outport)
				}
				else if inputs[inport].get_outvc(invc).is_none()
				{
					// Head/head-tail flit: routing left a candidate set open.
					let candidates = inputs[inport].get_outports(invc).to_vec();
					let ok = self.torus_send_allowed(inputs, outputs, inport, invc, &candidates, is_vnet_ordered, tick, rng);
					let outport = inputs[inport].get_outport(invc).unwrap_or(0);
					(ok, outport)
				}
				else
				{
					let outport = inputs[inport].get_outport(invc)
						.unwrap_or_else(|| panic!("{}", AllocatorError::MissingOutport.message()));
					let first_half = inputs[inport].get_firsthalf(invc);
					let outvc = inputs[inport].get_outvc(invc);
					let ok = self.send_allowed(inputs, outputs, inport, invc, outport, outvc, wormhole, first_half, is_vnet_ordered, tick);
					(ok, outport)
				};

				if make_request
				{
					self.input_arbiter_activity += 1;
					port_requests[inport] = Some(outport);
					vc_winners[inport] = Some(invc);
					break;
				}
			}
		}

		(port_requests, vc_winners)
	}

	/// `send_allowed`: a flit may be sent only if its outport has a free
	/// output VC (head flits) or a credited one already bound (body/tail),
	/// and — in an ordered vnet — no other ready flit on the same inport and
	/// vnet, targeting the same outport, was enqueued earlier. `first_half`
	/// restricts a head flit's free-VC search to the R1/R2 channel half in a
	/// torus; `None` means no such restriction.
	fn send_allowed(
		&self,
		inputs: &[InputUnit], outputs: &[OutputUnit],
		inport: usize, invc: usize, outport: usize, outvc: Option<usize>,
		wormhole: bool, first_half: Option<bool>,
		is_vnet_ordered: &impl Fn(usize) -> bool, tick: Time,
	) -> bool
	{
		let vnet = self.get_vnet(invc);
		let mut has_outvc = outvc.is_some();
		let mut has_credit = false;

		if !wormhole
		{
			if !has_outvc
			{
				// Only true for HEAD/HEAD_TAIL flits.
				match first_half
				{
					Some(true) => if outputs[outport].first_has_free_vc(vnet) { has_outvc = true; has_credit = true; },
					Some(false) => if outputs[outport].second_has_free_vc(vnet) { has_outvc = true; has_credit = true; },
					None => if outputs[outport].has_free_vc(vnet) { has_outvc = true; has_credit = true; },
				}
			}
			else
			{
				has_credit = outputs[outport].has_credit(outvc.expect("has_outvc implies outvc is Some"));
			}

			if !has_outvc || !has_credit
			{
				return false;
			}
		}
		else if !outputs[outport].has_vc_with_credits(vnet)
		{
			return false;
		}

		if is_vnet_ordered(vnet)
		{
			let t_enqueue_time = inputs[inport].get_enqueue_time(invc);
			let vc_base = vnet*self.vcs_per_vnet;
			for vc_offset in 0..self.vcs_per_vnet
			{
				let temp_vc = vc_base + vc_offset;
				if inputs[inport].need_stage(temp_vc, PipelineStage::Sa, tick)
					&& inputs[inport].get_outport(temp_vc) == Some(outport)
					&& inputs[inport].get_enqueue_time(temp_vc) < t_enqueue_time
				{
					return false;
				}
			}
		}

		true
	}

	/// `torus_send_allowed`: filter a head flit's candidate `(outport,
	/// first_half)` set down to the ones `send_allowed` admits, then grant a
	/// uniformly random one among them onto the VC. Every candidate is
	/// checked with `outvc = None` (unresolved) and `wormhole = false` —
	/// torus routing and wormhole flow control are mutually exclusive modes
	/// in the original, so this path never sees `wormhole = true`.
	fn torus_send_allowed(
		&self,
		inputs: &mut [InputUnit], outputs: &[OutputUnit],
		inport: usize, invc: usize, candidates: &[OutportHalf],
		is_vnet_ordered: &impl Fn(usize) -> bool, tick: Time,
		rng: &mut StdRng,
	) -> bool
	{
		let mut legal: Vec<(usize,bool)> = Vec::new();
		for c in candidates
		{
			if self.send_allowed(inputs, outputs, inport, invc, c.port, None, false, Some(c.first_half), is_vnet_ordered, tick)
			{
				let pair = (c.port, c.first_half);
				if !legal.contains(&pair)
				{
					legal.push(pair);
				}
			}
		}
		if legal.is_empty()
		{
			return false;
		}
		let (port, first_half) = legal[rng.gen_range(0..legal.len())];
		inputs[inport].grant_outport(invc, port);
		inputs[inport].grant_firsthalf(invc, first_half);
		true
	}

	/// SA-II: for each outport, pick the one SA-I winner requesting it
	/// (round-robin over inports starting at `round_robin_inport[outport]`),
	/// resolve its output VC if still unbound, and commit the grant. SA-I
	/// already confirmed admissibility for this exact `(outport, outvc)`
	/// pair this cycle, so this stage never re-runs `send_allowed`.
	fn arbitrate_outports(
		&mut self,
		inputs: &mut [InputUnit], outputs: &mut [OutputUnit],
		port_requests: Vec<Option<usize>>, vc_winners: Vec<Option<usize>>,
		is_torus: bool, wormhole: bool,
	) -> Vec<Grant>
	{
		let mut grants = Vec::new();
		for outport in 0..self.num_outports
		{
			let mut winner = None;
			for step in 0..self.num_inports
			{
				let inport = (self.round_robin_inport[outport] + step) % self.num_inports;
				if port_requests[inport] == Some(outport)
				{
					winner = Some(inport);
					break;
				}
			}
			let Some(inport) = winner else { continue };
			let invc = vc_winners[inport].expect("an inport with a pending port_request must have a vc_winner");

			let outvc = match inputs[inport].get_outvc(invc)
			{
				Some(outvc) => outvc,
				None =>
				{
					let vnet = self.get_vnet(invc);
					let first_half = if is_torus { inputs[inport].get_firsthalf(invc) } else { None };
					let outvc = self.vc_allocate(inputs, outputs, inport, invc, outport, vnet, wormhole, first_half)
						.unwrap_or_else(|| panic!("{}", AllocatorError::NoVcAvailable{outport}.message()));
					debug!("vc_allocate: inport {} invc {} -> outport {} outvc {}", inport, invc, outport, outvc);
					outvc
				},
			};

			outputs[outport].decrement_credit(outvc);
			inputs[inport].grant_outvc(invc, outvc);

			self.round_robin_inport[outport] = (inport + 1) % self.num_inports;
			self.round_robin_invc[inport] = (invc + 1) % inputs[inport].num_vcs();
			self.output_arbiter_activity += 1;

			let first_half = inputs[inport].get_firsthalf(invc).unwrap_or(true);
			trace!("SA-II grant: inport {} invc {} -> outport {} outvc {} (first_half={})", inport, invc, outport, outvc, first_half);
			grants.push(Grant{ inport, invc, outport, outvc, first_half });
		}
		grants
	}

	/// `vc_allocate`: bind a free output VC to the winner of an outport.
	/// Wormhole mode ignores the torus R1/R2 split entirely and picks any VC
	/// with credits; outside wormhole, a torus head restricts the search to
	/// whichever half (`first_half`) its granted candidate belongs to.
	fn vc_allocate(&mut self, inputs: &mut [InputUnit], outputs: &mut [OutputUnit], inport: usize, invc: usize, outport: usize, vnet: usize, wormhole: bool, first_half: Option<bool>) -> Option<usize>
	{
		let outvc = if wormhole
		{
			outputs[outport].select_vc_with_credits(vnet)
		}
		else
		{
			match first_half
			{
				Some(true) => outputs[outport].first_select_free_vc(vnet),
				Some(false) => outputs[outport].second_select_free_vc(vnet),
				None => outputs[outport].select_free_vc(vnet),
			}
		};
		if let Some(vc) = outvc
		{
			inputs[inport].grant_outvc(invc, vc);
		}
		outvc
	}

	/// `check_for_wakeup`: whether any input VC still has unserved, ready
	/// work this cycle — used by the surrounding event loop to decide
	/// whether to schedule another allocator cycle immediately.
	pub fn check_for_wakeup(&self, inputs: &[InputUnit], tick: Time) -> bool
	{
		inputs.iter().any(|unit| (0..unit.num_vcs()).any(|vc| unit.need_stage(vc, PipelineStage::Sa, tick)))
	}
}
