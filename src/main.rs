use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use strata::blocks::{AIR, BlockRegistry};
use strata::geom::Vec3;
use strata::render::HeadlessBackend;
use strata::world::World;
use strata::{AppConfig, Cli, Engine, FlyCamera, FrameStats};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    strata::logging::init(cli.log_file.as_deref(), cli.log_level)?;

    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::default(),
    };
    cfg.apply_cli(&cli);

    let registry = Arc::new(match &cfg.blocks {
        Some(path) => BlockRegistry::load_from_path(path)?,
        None => BlockRegistry::builtin()?,
    });
    log::info!("{} block types", registry.len());

    let world = Arc::new(World::new(cfg.world));
    let started = std::time::Instant::now();
    cfg.generator.as_generator().generate(&world, &registry)?;
    log::info!(
        "generated {}x{}x{} blocks in {:.2?}",
        world.size_x(),
        world.size_y(),
        world.size_z(),
        started.elapsed()
    );

    let stone = registry.id_by_name("stone").unwrap_or(AIR);
    let mut engine = Engine::new(
        cfg.engine.clone(),
        registry,
        Arc::clone(&world),
        HeadlessBackend::new(),
    )?;

    let centre = Vec3::new(
        world.size_x() as f32 * 0.5,
        world.size_y() as f32 * 0.75,
        world.size_z() as f32 * 0.5,
    );
    let orbit = (world.size_x().min(world.size_z()) as f32 * 0.35).max(8.0);
    let mut camera = FlyCamera::new(centre + Vec3::new(orbit, 0.0, 0.0));
    camera.move_speed = cli.speed;

    let mut last = FrameStats::default();
    let mut edits = 0usize;
    let mut angle = 0.0f32;
    for frame in 1..=cli.frames {
        angle += cli.speed / orbit;
        let target = centre + Vec3::new(orbit * angle.cos(), 0.0, orbit * angle.sin());
        camera.fly(target - camera.position, 1.0);
        camera.yaw = (angle.to_degrees() + 90.0) % 360.0;

        if cli.edit_every > 0 && frame % cli.edit_every == 0 {
            let (x, z) = (camera.position.x as i32, camera.position.z as i32);
            let top = (0..world.size_y())
                .rev()
                .find(|&y| engine.get_block(x, y, z) != AIR);
            if let Some(y) = top {
                if frame / cli.edit_every % 2 == 0 {
                    engine.set_block(x, y, z, AIR);
                } else if world.set_raw(x, y + 1, z, stone) {
                    // Raw writes skip dirty marking; tell the engine explicitly.
                    engine.notify_edit(x, y + 1, z);
                }
                edits += 1;
            }
        }

        last = engine.render(&camera)?;
        if frame % 60 == 0 {
            log::info!(
                "frame {}: {} chunks resident, {} visible, {} quads in {} draws",
                last.frame,
                last.table_chunks,
                last.visible_chunks,
                last.quads,
                last.draw_calls
            );
        }
    }

    let streaming = engine.streaming_stats();
    let scheduler = engine.scheduler_stats();
    engine.shutdown();
    let gpu = engine.backend().counters();
    println!("frames:            {}", last.frame);
    println!("edits:             {edits}");
    println!("resident chunks:   {}", last.table_chunks);
    println!("last frame quads:  {} ({} draw calls)", last.quads, last.draw_calls);
    println!(
        "builds:            {} submitted, {} completed, {} failed, {} discarded",
        scheduler.submitted, scheduler.completed, scheduler.failed, scheduler.discarded
    );
    println!(
        "streaming:         {} batches, {} uploads, {} stale, {} evicted",
        streaming.batches, streaming.uploaded, streaming.stale, streaming.evicted
    );
    println!(
        "gpu:               {} vertex buffers created, {} deleted, {} live",
        gpu.vertex_created,
        gpu.vertex_deleted,
        engine.backend().live_vertex_buffers()
    );
    Ok(())
}
