use kite_engine::coords::{Rect, Vec2, Viewport};
use kite_engine::draw::Canvas;
use kite_engine::input::{DirectionKeys, Key, MouseButton};
use kite_engine::logging::{init_logging, LoggingConfig};
use kite_engine::paint::Color;
use kite_engine::window::RuntimeConfig;
use kite_scene::{Behavior, Camera, NodeCtx, NodeView, Stage, StageConfig};

const WORLD: Rect = Rect::new(-600.0, -400.0, 1200.0, 800.0);
const TILE: f32 = 80.0;

/// Checkerboard covering the playable area.
struct Ground;

impl Behavior for Ground {
    fn render(&self, canvas: &mut Canvas, _node: NodeView<'_>) {
        let dark = Color::from_srgb_u8(0x2b, 0x3a, 0x2f, 0xff);
        let light = Color::from_srgb_u8(0x35, 0x47, 0x3a, 0xff);

        let cols = (WORLD.width() / TILE) as i32;
        let rows = (WORLD.height() / TILE) as i32;
        for row in 0..rows {
            for col in 0..cols {
                let color = if (row + col) % 2 == 0 { dark } else { light };
                let x = WORLD.left() + col as f32 * TILE;
                let y = WORLD.top() + row as f32 * TILE;
                canvas.fill_rect(Rect::new(x, y, TILE, TILE), color);
            }
        }
        canvas.stroke_rect(WORLD, 4.0, Color::WHITE);
    }
}

/// Arrow keys / WASD movement, clamped to the world.
struct Player {
    speed: f32,
}

impl Behavior for Player {
    fn update(&mut self, ctx: &mut NodeCtx<'_>) {
        let dir = ctx.input().vector(DirectionKeys::ARROWS) + ctx.input().vector(DirectionKeys::WASD);
        if dir.is_zero() {
            return;
        }
        let step = dir.normalize() * self.speed * ctx.dt();
        let next = ctx.position() + step;
        let clamped = Vec2::new(
            next.x.clamp(WORLD.left(), WORLD.right()),
            next.y.clamp(WORLD.top(), WORLD.bottom()),
        );
        ctx.set_position(clamped);
    }

    fn render(&self, canvas: &mut Canvas, node: NodeView<'_>) {
        let body = Rect::from_center_size(Vec2::ZERO, Vec2::splat(32.0));
        match node.assets.get("kite") {
            Some(sprite) => canvas.draw_image_rect(&sprite, body),
            None => canvas.fill_rect(body, Color::rgb(0.9, 0.55, 0.2)),
        }
    }
}

/// Spins around its parent.
struct Orbiter {
    radius: f32,
    speed: f32,
    angle: f32,
}

impl Behavior for Orbiter {
    fn physics(&mut self, ctx: &mut NodeCtx<'_>) {
        self.angle = (self.angle + self.speed * ctx.dt()) % std::f32::consts::TAU;
        ctx.set_position(Vec2::from_angle(self.angle) * self.radius);
        ctx.set_rotation(self.angle);
    }

    fn render(&self, canvas: &mut Canvas, _node: NodeView<'_>) {
        let r = Rect::from_center_size(Vec2::ZERO, Vec2::splat(12.0));
        canvas.fill_rect(r, Color::rgb(0.35, 0.7, 1.0));
    }
}

/// Mouse-wheel zoom, Escape to quit, click to log the world position.
struct CameraControl;

impl Behavior for CameraControl {
    fn update(&mut self, ctx: &mut NodeCtx<'_>) {
        if ctx.input().key_pressed(Key::Escape) {
            ctx.stop();
            return;
        }

        let wheel = ctx.input().wheel().y;
        if wheel != 0.0 {
            let id = ctx.id;
            if let Some(camera) = ctx.tree.camera_mut(id) {
                let zoom = (camera.zoom() * 1.1f32.powf(wheel)).clamp(0.25, 4.0);
                camera.set_zoom(zoom);
                log::debug!("zoom {zoom:.2}");
            }
        }

        if ctx.input().button_pressed(MouseButton::Left) {
            if let Some(p) = ctx.pointer_world() {
                log::info!("clicked world ({:.1}, {:.1})", p.x, p.y);
            }
        }
    }
}

fn build(stage: &mut Stage) -> anyhow::Result<()> {
    stage.assets_mut().load("assets/kite.png", Some("kite"));

    let tree = stage.tree_mut();
    let root = tree.root();

    let ground = tree.spawn_with(root, "ground", Ground)?;
    tree.set_z_index(ground, -10);

    let player = tree.spawn_with(root, "player", Player { speed: 240.0 })?;
    tree.spawn_with(
        player,
        "orbiter",
        Orbiter {
            radius: 48.0,
            speed: 3.0,
            angle: 0.0,
        },
    )?;

    let camera = tree.spawn_with(player, "camera", CameraControl)?;
    tree.add_camera(
        camera,
        Camera::new().with_smoothing(6.0).with_bounds(WORLD),
    )?;
    tree.set_main_camera(Some(camera))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::with_filter("info,wgpu_core=warn,wgpu_hal=warn"));

    let mut stage = Stage::new(StageConfig {
        base_size: Viewport::new(640.0, 360.0),
        ..StageConfig::default()
    });
    build(&mut stage)?;

    log::info!("arrows/WASD to move, wheel to zoom, Esc to quit");
    stage.run(RuntimeConfig {
        title: "kite demo".to_string(),
        ..RuntimeConfig::default()
    })
}
