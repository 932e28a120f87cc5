//! crossroads: one four-way junction driven through the arbitration engine.
//!
//! Runs the same random traffic twice: first under priority signs (the
//! north/south road is the main road, east/west traffic has stop signs), then
//! under a two-step timed signal.  Vehicles are points without car
//! following; only the engine decides who waits.

mod network;

use std::time::Instant;

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use ja_arbiter::{ApproachRequest, DecisionRequest, SpeedCap};
use ja_core::{EngineConfig, NodeId, Tick, VehicleId, VehicleKind};
use ja_engine::{EngineBuilder, EngineObserver, JunctionArbitrationEngine, TrackInput};
use ja_network::RoadNetwork;
use ja_registry::{MovementKey, PriorityType, SweepReport};
use ja_signal::{Step, StepChange, StepSignal};
use ja_tracker::PathPosition;

use network::{ARM_LENGTH, ARM_NAMES, Crossroads, build_network};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:           u64   = 42;
const TICKS:          u64   = 1_200;
const SPAWN_CHANCE:   f64   = 0.04; // per arm per tick
const CRUISE:         f32   = 6.0;  // distance units per tick
const ACCEL:          f32   = 0.5;
const BRAKE:          f32   = 0.5;
const SWEEP_INTERVAL: u64   = 256;

type Engine = JunctionArbitrationEngine<RoadNetwork>;

// ── Vehicles ──────────────────────────────────────────────────────────────────

struct Car {
    id:      VehicleId,
    kind:    VehicleKind,
    from:    usize,
    to:      usize,
    /// Distance to the stop line while approaching, distance past the
    /// junction once through.
    dist:    f32,
    speed:   f32,
    through: bool,
    spawned: u64,
}

impl Car {
    /// The first path positions, as a host pathfinder would hand them over.
    /// Offset 0 heads for the segment's start (the centre), 255 for its end.
    fn path(&self, x: &Crossroads) -> Vec<PathPosition> {
        let exit = PathPosition::new(x.arms[self.to], x.lanes[self.to], 255);
        if self.through {
            vec![exit]
        } else {
            vec![PathPosition::new(x.arms[self.from], x.lanes[self.from], 0), exit]
        }
    }

    fn request(&self, x: &Crossroads, now: Tick) -> ApproachRequest {
        let key = MovementKey::new(x.centre, x.arms[self.from]);
        let decision = DecisionRequest::new(self.id, key, self.speed, now).with_kind(self.kind);
        ApproachRequest::new(decision, self.dist)
    }

    /// Move one tick under `cap`.  Returns `true` when the car reaches the
    /// stop line and enters the junction.
    fn drive(&mut self, cap: Option<SpeedCap>) -> bool {
        let limit = cap.and_then(SpeedCap::limit).unwrap_or(CRUISE).min(CRUISE);
        self.speed = if limit < self.speed {
            (self.speed - BRAKE).max(limit)
        } else {
            (self.speed + ACCEL).min(limit)
        };
        if cap.is_some_and(SpeedCap::is_stop) {
            // Hold just short of the line.
            self.speed = self.speed.min((self.dist - 0.5).max(0.0));
        }
        self.dist -= self.speed;
        if self.dist > 0.0 {
            return false;
        }
        self.through = true;
        self.dist = -self.dist;
        true
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Counters {
    step_changes: usize,
    transits:     usize,
    swept:        usize,
}

impl EngineObserver for Counters {
    fn on_step_change(&mut self, _node: NodeId, _change: StepChange) {
        self.step_changes += 1;
    }

    fn on_sweep(&mut self, report: SweepReport) {
        self.swept += report.removed_vehicles;
    }

    fn on_transit(&mut self, _vehicle: VehicleId, _movement: MovementKey) {
        self.transits += 1;
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

fn priority_signs(engine: &Engine, x: &Crossroads) -> Result<()> {
    for (arm, sign) in [PriorityType::Main, PriorityType::Stop, PriorityType::Main, PriorityType::Stop]
        .into_iter()
        .enumerate()
    {
        engine.set_priority_type(MovementKey::new(x.centre, x.arms[arm]), Some(sign))?;
    }
    Ok(())
}

fn timed_signal(engine: &Engine, x: &Crossroads) -> Result<()> {
    let [north, east, south, west] = x.arms;
    engine.install_timed(
        x.centre,
        vec![
            Step::new(10, 60).with(north, StepSignal::green()).with(south, StepSignal::green()),
            Step::new(10, 60).with(east, StepSignal::green()).with(west, StepSignal::green()),
        ],
    )?;
    engine.start(x.centre, Tick::ZERO)?;
    Ok(())
}

struct Summary {
    entered:  [u32; 4],
    wait_sum: [u64; 4],
    counters: Counters,
}

fn run(name: &str, setup: fn(&Engine, &Crossroads) -> Result<()>) -> Result<(Engine, Summary)> {
    let (net, x) = build_network()?;
    let engine = EngineBuilder::new(net)
        .config(EngineConfig { seed: SEED, max_vehicles: 4_096, ..EngineConfig::default() })
        .build()?;
    setup(&engine, &x)?;

    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut cars: Vec<Car> = Vec::new();
    let mut next_id = 0u32;
    let mut summary = Summary { entered: [0; 4], wait_sum: [0; 4], counters: Counters::default() };
    let free_flow = (ARM_LENGTH / CRUISE).ceil() as u64;

    let t0 = Instant::now();
    for t in 0..TICKS {
        let now = Tick(t);

        // Spawn at the outer end of each arm.
        for from in 0..4 {
            if next_id as usize >= 4_096 || !rng.gen_bool(SPAWN_CHANCE) {
                continue;
            }
            let to = (from + rng.gen_range(1..4)) % 4;
            let kind = match rng.gen_range(0..100) {
                0 => VehicleKind::Emergency,
                1..=9 => VehicleKind::Bus,
                _ => VehicleKind::Car,
            };
            cars.push(Car {
                id: VehicleId(next_id),
                kind,
                from,
                to,
                dist: ARM_LENGTH,
                speed: CRUISE,
                through: false,
                spawned: t,
            });
            next_id += 1;
        }

        // ① Track.
        let paths: Vec<Vec<PathPosition>> = cars.iter().map(|c| c.path(&x)).collect();
        let batch: Vec<TrackInput<'_>> =
            cars.iter().zip(&paths).map(|(c, p)| (c.id, p.as_slice())).collect();
        engine.track_batch(&batch, now, &mut summary.counters);

        // ② Decide for everyone still approaching.
        let approaching: Vec<usize> = (0..cars.len()).filter(|&i| !cars[i].through).collect();
        let requests: Vec<ApproachRequest> =
            approaching.iter().map(|&i| cars[i].request(&x, now)).collect();
        let caps = engine.decide_batch(&requests);
        for (&i, cap) in approaching.iter().zip(caps) {
            let car = &mut cars[i];
            if car.drive(cap) {
                summary.entered[car.from] += 1;
                summary.wait_sum[car.from] += (t - car.spawned).saturating_sub(free_flow);
            }
        }

        // Cars past the junction drive off the map.
        for car in cars.iter_mut().filter(|c| c.through) {
            car.speed = (car.speed + ACCEL).min(CRUISE);
            car.dist += car.speed;
        }
        cars.retain(|c| {
            let gone = c.through && c.dist >= ARM_LENGTH;
            if gone {
                engine.remove_vehicle(c.id);
            }
            !gone
        });

        // ③ Signals and ④ housekeeping.
        engine.advance_signals(now, &mut summary.counters);
        if t > 0 && t % SWEEP_INTERVAL == 0 {
            engine.sweep(now, &mut summary.counters);
        }
    }
    let elapsed = t0.elapsed();

    println!("── {name} ──");
    println!("{TICKS} ticks in {:.3} s, {next_id} vehicles spawned", elapsed.as_secs_f64());
    println!("{:<8} {:>8} {:>12}", "Arm", "Entered", "Mean delay");
    println!("{}", "-".repeat(30));
    for arm in 0..4 {
        let n = summary.entered[arm];
        let mean = if n == 0 { 0.0 } else { summary.wait_sum[arm] as f64 / f64::from(n) };
        println!("{:<8} {:>8} {:>12.1}", ARM_NAMES[arm], n, mean);
    }
    println!(
        "step changes: {}  |  transits: {}  |  swept: {}",
        summary.counters.step_changes, summary.counters.transits, summary.counters.swept
    );
    println!();
    Ok((engine, summary))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    println!("=== crossroads: junction arbitration demo ===");
    println!("Ticks: {TICKS}  |  Spawn chance: {SPAWN_CHANCE} per arm  |  Seed: {SEED}");
    println!();

    let (signs, _) = run("priority signs", priority_signs)?;
    let (signal, _) = run("timed signal", timed_signal)?;

    // What a save game would store for each setup.
    println!("priority snapshot: {}", serde_json::to_string(&signs.snapshot())?);
    println!("signal snapshot:   {}", serde_json::to_string(&signal.snapshot())?);
    Ok(())
}
