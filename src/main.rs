// src/main.rs

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use background::{ControlPanel, Pipeline, SurfaceSize};
use log::{error, info};
use pollster::block_on;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

mod gfx;

use gfx::Gfx;

const INITIAL_SIZE: u32 = 512;
const MAX_TICKS_PER_FRAME: usize = 4;

// -----------------------------
// Debug stats (--debug)
// -----------------------------
struct Stats {
    sys: System,
    last: Instant,
    frames: u64,
    ticks: u64,
}

impl Stats {
    fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_all();
        Self {
            sys,
            last: Instant::now(),
            frames: 0,
            ticks: 0,
        }
    }

    fn maybe_report(&mut self, raster: Option<(usize, usize)>) {
        if self.last.elapsed() < Duration::from_secs(1) {
            return;
        }
        self.sys.refresh_cpu_all();
        self.sys.refresh_memory();

        let cpu = self.sys.global_cpu_usage();
        let mem_total = self.sys.total_memory();
        let mem_pct = if mem_total > 0 {
            (self.sys.used_memory() as f32 / mem_total as f32) * 100.0
        } else {
            0.0
        };

        info!(
            "CPU {:5.1}% | MEM {:5.1}% | FPS {} | ticks/s {} | raster {:?}",
            cpu, mem_pct, self.frames, self.ticks, raster
        );

        self.frames = 0;
        self.ticks = 0;
        self.last = Instant::now();
    }
}

// -----------------------------
// App
// -----------------------------
// Field order matters on drop: the GPU surface goes before the window.
struct App {
    gfx: Option<Gfx>,
    window: Option<Arc<Window>>,

    pipeline: Pipeline,
    tick_dt: f32,
    tick_accum: f32,
    last_frame: Instant,

    stats: Option<Stats>,
}

impl App {
    fn new(panel: ControlPanel) -> Self {
        let tick_dt = 1.0 / panel.ticks_per_second;
        let stats = panel.debug.then(Stats::new);
        Self {
            gfx: None,
            window: None,
            pipeline: Pipeline::new(panel),
            tick_dt,
            tick_accum: 0.0,
            last_frame: Instant::now(),
            stats,
        }
    }

    fn init_window(&mut self, el: &ActiveEventLoop) -> anyhow::Result<()> {
        let attrs = WindowAttributes::default()
            .with_title("background")
            .with_resizable(true)
            .with_inner_size(PhysicalSize::new(INITIAL_SIZE, INITIAL_SIZE));

        let win = Arc::new(el.create_window(attrs)?);
        let size = win.inner_size();
        let gfx = block_on(Gfx::new(win.clone(), size.width, size.height))?;
        info!("window {}x{} ready", size.width, size.height);

        self.window = Some(win);
        self.gfx = Some(gfx);
        self.last_frame = Instant::now();
        self.tick_accum = 0.0;
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_window(el) {
            error!("failed to start renderer: {e:#}");
            el.exit();
        }
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => el.exit(),

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    el.exit();
                }
            }

            WindowEvent::Resized(sz) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.resize(sz.width, sz.height);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        el.set_control_flow(ControlFlow::Poll);

        // ----------------------------
        // Frame timing
        // ----------------------------
        let now = Instant::now();
        let mut dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt.is_nan() || dt < 0.0 {
            dt = 0.0;
        }
        if dt > 0.25 {
            dt = 0.25;
        }
        self.tick_accum += dt;

        let (Some(win), Some(gfx)) = (self.window.as_ref(), self.gfx.as_mut()) else {
            return;
        };

        // ----------------------------
        // Pipeline ticks (dt-accumulated)
        // ----------------------------
        let mut ticked = 0usize;
        while self.tick_accum >= self.tick_dt && ticked < MAX_TICKS_PER_FRAME {
            self.tick_accum -= self.tick_dt;
            let size = win.inner_size();
            if !self.pipeline.tick(SurfaceSize::new(size.width, size.height), gfx) {
                // Minimised or too small: nothing to draw this round.
                self.tick_accum = 0.0;
                break;
            }
            ticked += 1;
        }
        if ticked == MAX_TICKS_PER_FRAME {
            self.tick_accum = self.tick_accum.min(self.tick_dt);
        }

        // ----------------------------
        // Render
        // ----------------------------
        if ticked > 0 {
            gfx.render();
        }

        if let Some(stats) = &mut self.stats {
            stats.frames += (ticked > 0) as u64;
            stats.ticks += ticked as u64;
            stats.maybe_report(self.pipeline.raster_size());
        }
    }

    fn exiting(&mut self, _el: &ActiveEventLoop) {
        info!("shutting down after {} ticks", self.pipeline.ticks());
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let panel = ControlPanel::from_args(std::env::args().skip(1))?;
    info!("starting with {panel:?}");

    let event_loop = EventLoop::new()?;
    let mut app = App::new(panel);
    event_loop.run_app(&mut app)?;
    Ok(())
}
