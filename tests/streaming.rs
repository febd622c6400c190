use std::sync::Arc;
use std::time::Duration;

use strata::blocks::{AIR, BlockRegistry, RenderGroup};
use strata::geom::Vec3;
use strata::mesh::{ChunkMesher, MeshPacket};
use strata::render::{BufferUsage, GpuError, HeadlessBackend, MAX_QUADS_U16};
use strata::runtime::ChunkBuilder;
use strata::world::generation::{FlatGenerator, WorldGenerator};
use strata::world::{ChunkCoord, World, WorldConfig};
use strata::{Engine, EngineConfig, EngineError, FlyCamera, FrameStats};

fn setup(radius: i32, backend: HeadlessBackend) -> (Engine<HeadlessBackend>, Arc<World>) {
    let reg = Arc::new(BlockRegistry::builtin().unwrap());
    let world = Arc::new(World::new(WorldConfig {
        chunks_x: 6,
        chunks_y: 4,
        chunks_z: 6,
    }));
    FlatGenerator::default().generate(&world, &reg).unwrap();
    let cfg = EngineConfig {
        render_radius: radius,
        workers: 2,
        batch_capacity: 4,
        ..EngineConfig::default()
    };
    let engine = Engine::new(cfg, reg, world.clone(), backend).unwrap();
    (engine, world)
}

fn camera_at(x: f32, y: f32, z: f32) -> FlyCamera {
    FlyCamera::new(Vec3::new(x, y, z))
}

fn settle(engine: &mut Engine<HeadlessBackend>, camera: &FlyCamera) -> FrameStats {
    for _ in 0..20_000 {
        let stats = engine.render(camera).unwrap();
        if !stats.building && stats.pending_dirty == 0 && stats.pending_updates == 0 {
            return stats;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("streaming never settled");
}

fn assert_radius_invariant(engine: &Engine<HeadlessBackend>, center: ChunkCoord) {
    let keep = engine.config().render_radius + 1;
    for c in engine.streaming().table().coords() {
        assert!(c.chebyshev(center) <= keep, "{c:?} resident beyond radius");
    }
}

fn assert_buffers_match_table(engine: &Engine<HeadlessBackend>) {
    let table = engine.streaming().table();
    let owned: usize = table
        .coords()
        .map(|c| table.get(c).unwrap().buffer_count())
        .sum();
    assert_eq!(engine.backend().live_vertex_buffers(), owned);
    assert_eq!(engine.backend().invalid_deletes(), 0);
}

#[test]
fn first_frames_stream_in_the_camera_neighbourhood() {
    let (mut engine, _world) = setup(2, HeadlessBackend::new());
    let camera = camera_at(40.0, 40.0, 40.0);
    let stats = settle(&mut engine, &camera);
    assert!(stats.table_chunks > 0);
    assert!(stats.quads > 0);
    assert_radius_invariant(&engine, camera.chunk());
    assert_buffers_match_table(&engine);
    assert_eq!(engine.backend().live_index_buffers(), 1);
}

#[test]
fn moving_away_evicts_each_record_exactly_once() {
    let (mut engine, world) = setup(1, HeadlessBackend::new());
    let start = camera_at(8.0, 40.0, 8.0);
    settle(&mut engine, &start);
    let before: Vec<ChunkCoord> = engine.streaming().table().coords().collect();
    assert!(!before.is_empty());

    let far = camera_at(88.0, 40.0, 88.0);
    settle(&mut engine, &far);
    assert_radius_invariant(&engine, far.chunk());
    assert_buffers_match_table(&engine);
    assert!(engine.streaming_stats().evicted > 0);
    for c in before {
        if c.chebyshev(far.chunk()) > 2 {
            assert!(!engine.streaming().table().contains(c));
            assert!(world.chunk(c).unwrap().is_new(), "{c:?} not reset to new");
        }
    }

    // Coming back rebuilds what was evicted.
    let stats = settle(&mut engine, &start);
    assert!(stats.table_chunks > 0);
    assert_buffers_match_table(&engine);
}

#[test]
fn set_block_rebuilds_with_stream_buffers() {
    let (mut engine, world) = setup(1, HeadlessBackend::new());
    let camera = camera_at(40.0, 40.0, 40.0);
    settle(&mut engine, &camera);

    let stone = engine.registry().id_by_name("stone").unwrap();
    // Grass surface is at y = 32; float a block just above it.
    let owner = ChunkCoord::of_block(40, 34, 40);
    let builds = world.chunk(owner).unwrap().build_count();
    assert!(engine.set_block(40, 34, 40, stone));
    assert_eq!(engine.get_block(40, 34, 40), stone);
    settle(&mut engine, &camera);

    assert!(world.chunk(owner).unwrap().build_count() > builds);
    let render = engine.streaming().table().get(owner).unwrap();
    for buf in render.parts(RenderGroup::Terrain) {
        assert_eq!(buf.usage(), BufferUsage::Stream);
    }
    assert_buffers_match_table(&engine);
}

#[test]
fn notify_edit_picks_up_raw_writes() {
    let (mut engine, world) = setup(1, HeadlessBackend::new());
    let camera = camera_at(40.0, 40.0, 40.0);
    settle(&mut engine, &camera);

    let owner = ChunkCoord::of_block(40, 33, 40);
    let quads = engine.streaming().table().get(owner).unwrap().quad_count();
    let stone = engine.registry().id_by_name("stone").unwrap();
    assert!(world.set_raw(40, 33, 40, stone));
    settle(&mut engine, &camera);
    assert_eq!(
        engine.streaming().table().get(owner).unwrap().quad_count(),
        quads,
        "raw write must not trigger a rebuild"
    );

    engine.notify_edit(40, 33, 40);
    settle(&mut engine, &camera);
    // One cube on a flat floor: four sides and a top, minus the floor top it now covers.
    assert_eq!(
        engine.streaming().table().get(owner).unwrap().quad_count(),
        quads + 4
    );
}

#[test]
fn out_of_bounds_edits_are_ignored() {
    let (mut engine, world) = setup(1, HeadlessBackend::new());
    let camera = camera_at(40.0, 40.0, 40.0);
    settle(&mut engine, &camera);
    assert!(!engine.set_block(-1, 10, 10, 1));
    assert!(!engine.set_block(10, world.size_y(), 10, 1));
    assert_eq!(engine.get_block(-1, 10, 10), AIR);
    engine.notify_edit(10_000, 0, 0);
    let stats = engine.render(&camera).unwrap();
    assert_eq!(stats.pending_dirty, 0);
    assert!(!stats.building);
}

#[test]
fn shutdown_releases_everything() {
    let (mut engine, _world) = setup(2, HeadlessBackend::new());
    let camera = camera_at(40.0, 40.0, 40.0);
    // Leave work in flight on purpose.
    engine.render(&camera).unwrap();
    engine.shutdown();
    assert!(engine.is_shut_down());
    assert_eq!(engine.backend().live_vertex_buffers(), 0);
    assert_eq!(engine.backend().live_index_buffers(), 0);
    assert_eq!(engine.backend().invalid_deletes(), 0);
    assert!(matches!(engine.render(&camera), Err(EngineError::ShutDown)));
    engine.shutdown();
    assert_eq!(engine.backend().invalid_deletes(), 0);
}

#[test]
fn exhausted_gpu_memory_surfaces_as_error() {
    let (mut engine, _world) = setup(2, HeadlessBackend::with_vertex_budget(1024));
    let camera = camera_at(40.0, 40.0, 40.0);
    let mut failure = None;
    for _ in 0..20_000 {
        match engine.render(&camera) {
            Ok(_) => std::thread::sleep(Duration::from_millis(1)),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    assert!(matches!(
        failure,
        Some(EngineError::Gpu(GpuError::Allocation { .. }))
    ));
}

#[test]
fn settled_geometry_matches_a_synchronous_build() {
    let (mut engine, world) = setup(2, HeadlessBackend::new());
    let camera = camera_at(40.0, 40.0, 40.0);
    settle(&mut engine, &camera);
    let stone = engine.registry().id_by_name("stone").unwrap();
    for (i, x) in (30..50).step_by(3).enumerate() {
        let id = if i % 2 == 0 { stone } else { AIR };
        engine.set_block(x, 32 + (i as i32 % 3), 47 - i as i32, id);
    }
    settle(&mut engine, &camera);

    let reg = engine.registry().clone();
    let mut packet = MeshPacket::default();
    let center = camera.chunk();
    for ring in 0..=engine.config().render_radius {
        center.for_each_in_ring(ring, |c| {
            if !world.in_bounds_chunk(c) {
                return;
            }
            let quads = ChunkMesher::build(&world, &reg, c, &mut packet);
            let resident = engine
                .streaming()
                .table()
                .get(c)
                .map_or(0, |r| r.quad_count());
            assert_eq!(resident, quads, "chunk {c:?}");
        });
    }
}

struct DenseBuilder(usize);

impl ChunkBuilder for DenseBuilder {
    fn build_chunk(
        &self,
        _world: &World,
        _reg: &BlockRegistry,
        _coord: ChunkCoord,
        packet: &mut MeshPacket,
    ) -> usize {
        let mb = packet.group_mut(RenderGroup::Terrain);
        for q in 0..self.0 {
            let o = Vec3::new((q % 16) as f32, (q / 256) as f32, (q / 16 % 16) as f32);
            let vs = [
                o,
                o + Vec3::new(1.0, 0.0, 0.0),
                o + Vec3::new(1.0, 0.0, 1.0),
                o + Vec3::new(0.0, 0.0, 1.0),
            ];
            mb.add_quad(vs, Vec3::UP, [1.0; 4], [(0.0, 0.0); 4]);
        }
        self.0
    }
}

#[test]
fn oversized_max_quads_is_capped_by_the_index_buffer() {
    let reg = Arc::new(BlockRegistry::builtin().unwrap());
    let world = Arc::new(World::new(WorldConfig {
        chunks_x: 1,
        chunks_y: 1,
        chunks_z: 1,
    }));
    let cfg = EngineConfig {
        render_radius: 1,
        workers: 1,
        batch_capacity: 1,
        max_quads: 20_000,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_builder(
        cfg,
        reg,
        world.clone(),
        HeadlessBackend::new(),
        Arc::new(DenseBuilder(20_000)),
    )
    .unwrap();
    assert_eq!(engine.max_quads(), MAX_QUADS_U16);

    let stats = settle(&mut engine, &camera_at(8.0, 8.0, 8.0));
    assert_eq!(stats.quads, 20_000);
    let render = engine.streaming().table().get(ChunkCoord::new(0, 0, 0)).unwrap();
    let parts = render.parts(RenderGroup::Terrain);
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|b| b.quads() <= engine.max_quads()));
    assert!(engine.backend().draws().iter().all(|d| d.quads <= MAX_QUADS_U16));
    assert_buffers_match_table(&engine);
}
