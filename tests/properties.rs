use barnes_hut_sim::ultraviolet::DVec2;
use barnes_hut_sim::{
    Body, GravityParameters, Quad, QuadTreeConfig, Quadrant, Quadtree, Simulation,
    SimulationConfig, SpawnConfig, utils,
};

const EXTENT: f64 = 800.0;

/// Seeded random bodies spread over the default domain.
pub fn bodies(n: usize, seed: u64) -> Vec<Body> {
    let spawn = SpawnConfig {
        num_bodies: n,
        seed: Some(seed),
        ..SpawnConfig::default()
    };
    utils::random_bodies(&spawn, EXTENT)
}

pub fn gravity(theta: f64) -> GravityParameters {
    GravityParameters {
        opening_angle: theta,
        ..GravityParameters::default()
    }
}

pub fn build(bodies: &[Body], theta: f64) -> Quadtree {
    let mut tree = Quadtree::new(&gravity(theta), &QuadTreeConfig::default());
    tree.clear(Quad::domain(EXTENT));
    assert_eq!(tree.insert_all(bodies), 0);
    tree
}

/// Force on every body as evaluated through the tree.
pub fn tree_forces(tree: &Quadtree, bodies: &[Body]) -> Vec<DVec2> {
    bodies
        .iter()
        .enumerate()
        .map(|(index, body)| {
            let mut body = *body;
            body.reset_force();
            tree.update_force(index, &mut body);
            body.force
        })
        .collect()
}

fn assert_close(a: f64, b: f64, rel: f64) {
    assert!(
        (a - b).abs() <= rel * a.abs().max(b.abs()).max(1e-300),
        "{a} != {b} (relative tolerance {rel})"
    );
}

fn assert_close_vec(a: DVec2, b: DVec2, rel: f64) {
    assert!(
        (a - b).mag() <= rel * a.mag().max(b.mag()) + 1e-12,
        "{a:?} != {b:?} (relative tolerance {rel})"
    );
}

fn seeded_config(n: usize) -> SimulationConfig {
    SimulationConfig {
        spawn: SpawnConfig {
            num_bodies: n,
            seed: Some(9),
            ..SpawnConfig::default()
        },
        ..SimulationConfig::default()
    }
}

// ==================================================================================
// Tree aggregates
// ==================================================================================

#[test]
fn root_mass_matches_body_masses_every_tick() {
    let mut sim = Simulation::new(seeded_config(300)).unwrap();
    for _ in 0..10 {
        let tree = build(sim.bodies(), 0.5);
        assert_close(tree.root().mass, utils::total_mass(sim.bodies()), 1e-12);
        sim.step();
    }
}

#[test]
fn root_center_of_mass_is_weighted_centroid() {
    let bodies = bodies(500, 1);
    let tree = build(&bodies, 0.5);
    assert_close_vec(tree.root().pos, utils::center_of_mass(&bodies), 1e-12);
}

#[test]
fn every_node_aggregates_its_subtree() {
    fn check(tree: &Quadtree, node: usize) -> (f64, DVec2) {
        let (mass, weighted) = match tree.child(node, Quadrant::NorthWest) {
            Some(_) => Quadrant::ALL.iter().fold((0.0, DVec2::zero()), |(m, w), q| {
                let (cm, cw) = check(tree, tree.child(node, *q).unwrap());
                (m + cm, w + cw)
            }),
            None => tree
                .entries_of(node)
                .fold((0.0, DVec2::zero()), |(m, w), e| (m + e.mass, w + e.pos * e.mass)),
        };
        let n = &tree.nodes[node];
        assert_close(n.mass, mass, 1e-12);
        if mass > 0.0 {
            assert_close_vec(n.pos, weighted / mass, 1e-12);
        }
        (mass, weighted)
    }

    let bodies = bodies(400, 2);
    let tree = build(&bodies, 0.5);
    check(&tree, Quadtree::ROOT);
}

#[test]
fn insertion_order_does_not_change_aggregates() {
    fn compare(a: &Quadtree, na: usize, b: &Quadtree, nb: usize) {
        assert_eq!(a.nodes[na].quad, b.nodes[nb].quad);
        assert_close(a.nodes[na].mass, b.nodes[nb].mass, 1e-12);
        assert_close_vec(a.nodes[na].pos, b.nodes[nb].pos, 1e-12);
        if let (Some(_), Some(_)) = (
            a.child(na, Quadrant::NorthWest),
            b.child(nb, Quadrant::NorthWest),
        ) {
            for q in Quadrant::ALL {
                compare(a, a.child(na, q).unwrap(), b, b.child(nb, q).unwrap());
            }
        }
    }

    let bodies = bodies(300, 3);
    let forward = build(&bodies, 0.5);

    let mut reversed = Quadtree::new(&gravity(0.5), &QuadTreeConfig::default());
    reversed.clear(Quad::domain(EXTENT));
    for (index, body) in bodies.iter().enumerate().rev() {
        assert!(reversed.insert(index, body.pos, body.mass));
    }

    compare(&forward, Quadtree::ROOT, &reversed, Quadtree::ROOT);
    assert_eq!(forward.nodes.len(), reversed.nodes.len());
}

#[test]
fn coincident_bodies_terminate() {
    let bodies: Vec<Body> = (0..1000)
        .map(|_| Body::new(DVec2::new(123.0, 456.0), DVec2::zero(), 1.0))
        .collect();
    let tree = build(&bodies, 0.5);

    assert_close(tree.root().mass, 1000.0, 1e-12);
    assert!(tree.nodes.len() <= 4 * QuadTreeConfig::default().max_depth + 1);

    // Nobody pulls on anybody: every partner sits at zero distance
    for force in tree_forces(&tree, &bodies) {
        assert_eq!(force, DVec2::zero());
    }
}

// ==================================================================================
// Regions
// ==================================================================================

#[test]
fn quadrants_partition_random_regions() {
    let mut rng = fastrand::Rng::with_seed(4);
    for _ in 0..100 {
        let quad = Quad::new(
            DVec2::new(rng.f64() * 100.0 - 50.0, rng.f64() * 100.0 - 50.0),
            rng.f64() * 10.0 + 0.1,
        );
        let half = quad.size / 2.0;
        let center = quad.center();

        for q in Quadrant::ALL {
            let child = quad.quadrant(q);
            assert_eq!(child.size, half);
            assert!(quad.contains(child.origin));
        }
        let [nw, ne, sw, se] = quad.subdivide();
        assert_eq!(nw.origin, quad.origin);
        assert_eq!(ne.origin, DVec2::new(center.x, quad.origin.y));
        assert_eq!(sw.origin, DVec2::new(quad.origin.x, center.y));
        assert_eq!(se.origin, center);

        // Every sampled point lands in exactly the child chosen for it
        for _ in 0..20 {
            let pos = quad.origin + DVec2::new(rng.f64(), rng.f64()) * quad.size;
            let chosen = quad.find_quadrant(pos);
            assert!(quad.quadrant(chosen).contains(pos));
        }
    }
}

// ==================================================================================
// Force evaluation
// ==================================================================================

#[test]
fn bodies_never_pull_on_themselves() {
    let lone = [Body::new(DVec2::new(10.0, 10.0), DVec2::zero(), 4.0)];
    let tree = build(&lone, 0.0);
    assert_eq!(tree_forces(&tree, &lone), vec![DVec2::zero()]);

    let pair = [
        Body::new(DVec2::new(100.0, 100.0), DVec2::zero(), 4.0),
        Body::new(DVec2::new(700.0, 700.0), DVec2::zero(), 4.0),
    ];
    let tree = build(&pair, 0.0);
    let mut expected = pair[0];
    expected.add_force(pair[1].pos, pair[1].mass, &gravity(0.0));
    assert_eq!(tree_forces(&tree, &pair)[0], expected.force);
}

#[test]
fn zero_opening_angle_matches_direct_sum() {
    let mut bodies = bodies(200, 5);
    let tree = build(&bodies, 0.0);
    let forces = tree_forces(&tree, &bodies);

    utils::direct_sum(&mut bodies, &gravity(0.0));
    for (force, body) in forces.iter().zip(&bodies) {
        assert_close_vec(*force, body.force, 1e-9);
    }
}

#[test]
fn default_opening_angle_stays_close_to_direct_sum() {
    let mut bodies = bodies(500, 6);
    let tree = build(&bodies, 0.5);
    let forces = tree_forces(&tree, &bodies);

    utils::direct_sum(&mut bodies, &gravity(0.5));
    let error: f64 = forces
        .iter()
        .zip(&bodies)
        .map(|(f, b)| (*f - b.force).mag())
        .sum();
    let scale: f64 = bodies.iter().map(|b| b.force.mag()).sum();
    assert!(error < 0.05 * scale, "mean relative error {}", error / scale);
}

#[test]
fn smaller_opening_angle_never_expands_less() {
    let bodies = bodies(400, 7);
    let mut tree = build(&bodies, 0.0);
    let thetas = [2.0, 1.0, 0.7, 0.5, 0.3, 0.1, 0.0];

    for (index, body) in bodies.iter().enumerate().step_by(10) {
        let mut previous = 0;
        for theta in thetas {
            tree.set_opening_angle(theta);
            let mut probe = *body;
            let expansions = tree.update_force(index, &mut probe).expansions;
            assert!(
                expansions >= previous,
                "theta {theta}: {expansions} expansions after {previous}"
            );
            previous = expansions;
        }
    }
}

// ==================================================================================
// Scenarios
// ==================================================================================

#[test]
fn symmetric_pair_feels_opposite_forces() {
    let bodies = vec![
        Body::new(DVec2::new(300.0, 400.0), DVec2::zero(), 5.0),
        Body::new(DVec2::new(500.0, 400.0), DVec2::zero(), 5.0),
    ];
    let mut sim = Simulation::with_bodies(SimulationConfig::default(), bodies).unwrap();
    sim.step();

    let [a, b] = [sim.bodies()[0], sim.bodies()[1]];
    assert!(a.force.x > 0.0);
    assert_eq!(a.force, DVec2::new(-b.force.x, -b.force.y));
    assert_eq!(a.force.y, 0.0);
    assert_close(a.pos.x - 400.0, 400.0 - b.pos.x, 1e-12);
}

#[test]
fn body_past_left_edge_is_reflected() {
    let bodies = vec![Body::new(DVec2::new(-1.0, 400.0), DVec2::new(-2.0, 0.0), 1.0)];
    let mut sim = Simulation::with_bodies(SimulationConfig::default(), bodies).unwrap();
    let report = sim.step();

    assert_eq!(report.dropped, 1);
    let body = sim.bodies()[0];
    assert_eq!(body.pos.x, 0.0);
    assert_eq!(body.vel.x, 2.0);
}

#[test]
fn seeded_runs_are_deterministic() {
    let mut a = Simulation::new(seeded_config(100)).unwrap();
    let mut b = Simulation::new(seeded_config(100)).unwrap();
    for _ in 0..5 {
        assert_eq!(a.step(), b.step());
    }
    assert_eq!(a.bodies(), b.bodies());
}

#[test]
fn bodies_stay_inside_the_domain() {
    let mut sim = Simulation::new(seeded_config(200)).unwrap();
    for _ in 0..50 {
        let report = sim.step();
        assert_eq!(report.dropped, 0);
    }
    let domain = Quad::domain(EXTENT);
    assert!(sim.bodies().iter().all(|b| domain.contains(b.pos)));
}
