use frond::{
    CollisionWorld, ConstraintSolver, Integrator, ParticleNode, SolverConfig, TileGrid, Vec2,
    WorldConfig,
};

fn anemone(base: Vec2<f32>) -> ParticleNode<f32> {
    let mut root = ParticleNode::fixed(base);
    root.world_radius = 0.2;
    for arm in 0..5 {
        let dx = (arm as f32 - 2.0) * 0.35;
        let mut tip = &mut root;
        for _ in 0..6 {
            tip = tip.create_child(Vec2::new(dx, -0.45), 0.92);
        }
    }
    root
}

fn run(integrator: Integrator) -> Vec<(f32, f32)> {
    let grid = TileGrid::from_rows(&[
        "............",
        "...##.......",
        "............",
        "........#...",
        "............",
        "############",
    ]);
    let config = SolverConfig::new()
        .with_integrator(integrator)
        .with_gravity(Vec2::new(0.4, -0.2))
        .with_spring_iterations(2);
    let solver = ConstraintSolver::new(config)
        .with_world(CollisionWorld::new(&grid, WorldConfig::default()));

    let mut roots = [anemone(Vec2::new(3.0, 4.8)), anemone(Vec2::new(8.0, 4.8))];
    for step in 0..240 {
        if step % 40 == 0 {
            for root in roots.iter_mut() {
                root.apply_cascading_force(Vec2::new(-3.0, 1.0), 0.85);
            }
        }
        solver.step(1.0 / 60.0, &mut roots);
    }
    solver.flatten(&roots).iter().map(|n| (n.pos.x, n.pos.y)).collect()
}

#[test]
fn euler_runs_are_bitwise_identical() {
    let results: Vec<_> = (0..5).map(|_| run(Integrator::Euler)).collect();
    for r in &results[1..] {
        for (a, b) in results[0].iter().zip(r.iter()) {
            assert_eq!(a.0.to_bits(), b.0.to_bits());
            assert_eq!(a.1.to_bits(), b.1.to_bits());
        }
    }
}

#[test]
fn verlet_runs_are_bitwise_identical() {
    let results: Vec<_> = (0..5).map(|_| run(Integrator::Verlet)).collect();
    for r in &results[1..] {
        assert_eq!(results[0].len(), r.len());
        for (a, b) in results[0].iter().zip(r.iter()) {
            assert_eq!(a.0.to_bits(), b.0.to_bits());
            assert_eq!(a.1.to_bits(), b.1.to_bits());
        }
    }
}
