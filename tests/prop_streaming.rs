use std::sync::Arc;

use proptest::prelude::*;
use strata::blocks::{AIR, BlockRegistry};
use strata::geom::Vec3;
use strata::render::HeadlessBackend;
use strata::world::generation::{NoiseGenerator, WorldGenerator};
use strata::world::{World, WorldConfig};
use strata::{Engine, EngineConfig, FlyCamera};

#[derive(Clone, Debug)]
enum Step {
    Move { x: f32, z: f32 },
    Edit { x: i32, y: i32, z: i32, solid: bool },
    Frame,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => (0.0f32..96.0, 0.0f32..96.0).prop_map(|(x, z)| Step::Move { x, z }),
        3 => (0i32..96, 24i32..56, 0i32..96, any::<bool>())
            .prop_map(|(x, y, z, solid)| Step::Edit { x, y, z, solid }),
        3 => Just(Step::Frame),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Whatever the camera and edits do, resident geometry stays within radius + 1 and every
    // GPU buffer belongs to exactly one resident record.
    #[test]
    fn camera_moves_and_edits_keep_residency_bounded(steps in prop::collection::vec(step(), 1..60)) {
        let reg = Arc::new(BlockRegistry::builtin().unwrap());
        let stone = reg.id_by_name("stone").unwrap();
        let world = Arc::new(World::new(WorldConfig { chunks_x: 6, chunks_y: 4, chunks_z: 6 }));
        NoiseGenerator::default().generate(&world, &reg).unwrap();
        let cfg = EngineConfig {
            render_radius: 1,
            workers: 2,
            batch_capacity: 3,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(cfg, reg, world.clone(), HeadlessBackend::new()).unwrap();
        let mut camera = FlyCamera::new(Vec3::new(48.0, 48.0, 48.0));

        for s in steps {
            match s {
                Step::Move { x, z } => camera.position = Vec3::new(x, 48.0, z),
                Step::Edit { x, y, z, solid } => {
                    engine.set_block(x, y, z, if solid { stone } else { AIR });
                }
                Step::Frame => {}
            }
            engine.render(&camera).unwrap();

            let center = camera.chunk();
            let table = engine.streaming().table();
            let mut owned = 0;
            for c in table.coords() {
                prop_assert!(c.chebyshev(center) <= 2);
                owned += table.get(c).unwrap().buffer_count();
            }
            prop_assert_eq!(engine.backend().live_vertex_buffers(), owned);
            prop_assert_eq!(engine.backend().invalid_deletes(), 0);
        }

        engine.shutdown();
        prop_assert_eq!(engine.backend().live_vertex_buffers(), 0);
        prop_assert_eq!(engine.backend().live_index_buffers(), 0);
        for chunk in world.loaded_chunks() {
            prop_assert!(chunk.is_safe_to_read());
        }
    }
}
