//! Headless driver for the ocean LOD system.
//!
//! Flies a viewer over an analytic wave surface, climbing and diving, and logs
//! how the LOD scale, blend weight and viewer height follow.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p swell-demo -- --frames 1200 --max-scale -1`.

mod surface;

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use glam::Vec3;
use swell_config::{CliArgs, Config};
use swell_lod::{FrameId, LodTransform, Ocean};
use tracing::{info, warn};

use surface::{FIXED_DT, WaveComponent, WaveSurface};

/// Frames between progress reports.
const REPORT_INTERVAL: u64 = 60;

/// Scripted viewer flight: a slow orbit with altitude swinging from just
/// below the surface to high above it, plus a short tracking outage.
struct FlightPath {
    floor: f32,
    ceiling: f32,
    period: f32,
    orbit_radius: f32,
    outage: std::ops::Range<u64>,
}

impl FlightPath {
    fn viewpoint(&self, frame: FrameId) -> Option<Vec3> {
        if self.outage.contains(&frame.0) {
            return None;
        }
        let t = frame.0 as f32 * FIXED_DT;
        let phase = t / self.period * std::f32::consts::TAU;
        let altitude = self.floor + (self.ceiling - self.floor) * 0.5 * (1.0 - phase.cos());
        let orbit = phase * 0.25;
        Some(Vec3::new(
            self.orbit_radius * orbit.cos(),
            altitude,
            self.orbit_radius * orbit.sin(),
        ))
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("swell"))
            .unwrap_or_else(|| PathBuf::from(".swell"))
    });

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    swell_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let components = vec![WaveComponent::swell(), WaveComponent::chop()];
    let transform = Rc::new(RefCell::new(LodTransform::new()));
    let mut ocean = match Ocean::builder(&config)
        .height_provider(WaveSurface::new(components.clone()))
        .layer(Rc::clone(&transform))
        .build()
    {
        Ok(ocean) => ocean,
        Err(_) => return ExitCode::FAILURE,
    };
    for component in &components {
        let (horizontal, vertical) = component.displacement_bounds();
        info!(
            contributor = component.name,
            horizontal, vertical, "registered shape contributor"
        );
    }

    let flight = FlightPath {
        floor: -1.5,
        ceiling: 900.0,
        period: 8.0,
        orbit_radius: 250.0,
        outage: 300..310,
    };

    let mut frame = FrameId::default();
    let mut last_scale = ocean.frame().scale.scale;
    let mut scale_changes = 0u32;
    let mut underwater_frames = 0u64;

    for _ in 0..args.frames {
        frame = frame.next();
        let viewpoint = flight.viewpoint(frame);
        ocean.update(frame, viewpoint);

        // Contributors report after the controller has run; the bound reaches
        // the scale computation next frame.
        for component in &components {
            let (horizontal, vertical) = component.displacement_bounds();
            ocean.report_displacement(horizontal, vertical, frame);
        }

        let state = ocean.frame().scale;
        if state.scale != last_scale {
            scale_changes += 1;
            last_scale = state.scale;
        }
        if ocean.viewer().is_underwater() {
            underwater_frames += 1;
        }

        if frame.0 % REPORT_INTERVAL == 0 {
            let ring0 = transform.borrow().render_data(0).copied();
            info!(
                frame = frame.0,
                viewer_y = ?viewpoint.map(|v| v.y),
                scale = state.scale,
                level_alpha = state.level_alpha,
                height_above_water = ocean.viewer().height_above_water(),
                ring0_texel = ?ring0.map(|r| r.texel_width),
                could_increase = ocean.controller().scale_could_increase(),
                could_decrease = ocean.controller().scale_could_decrease(),
                "ocean lod"
            );
        }

        if ocean.viewer().consecutive_misses() == 30 {
            warn!(frame = frame.0, "viewer height unavailable for 30 frames");
        }
    }

    info!(
        frames = args.frames,
        scale_changes,
        underwater_frames,
        final_scale = ocean.frame().scale.scale,
        max_vertical = ocean.displacement().current_vertical(),
        "simulation finished"
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> FlightPath {
        FlightPath {
            floor: -1.5,
            ceiling: 900.0,
            period: 8.0,
            orbit_radius: 250.0,
            outage: 300..310,
        }
    }

    #[test]
    fn test_flight_starts_below_surface() {
        let v = flight().viewpoint(FrameId(0)).unwrap();
        assert!((v.y + 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_flight_outage_has_no_viewpoint() {
        let path = flight();
        assert!(path.viewpoint(FrameId(299)).is_some());
        assert!(path.viewpoint(FrameId(300)).is_none());
        assert!(path.viewpoint(FrameId(309)).is_none());
        assert!(path.viewpoint(FrameId(310)).is_some());
    }

    #[test]
    fn test_demo_pipeline_runs_headless() {
        let components = vec![WaveComponent::swell(), WaveComponent::chop()];
        let transform = Rc::new(RefCell::new(LodTransform::new()));
        let mut ocean = Ocean::builder(&Config::default())
            .height_provider(WaveSurface::new(components.clone()))
            .layer(Rc::clone(&transform))
            .build()
            .unwrap();

        let path = flight();
        let mut frame = FrameId::default();
        for _ in 0..240 {
            frame = frame.next();
            ocean.update(frame, path.viewpoint(frame));
            for c in &components {
                let (h, v) = c.displacement_bounds();
                ocean.report_displacement(h, v, frame);
            }
        }
        assert_eq!(transform.borrow().frame_id(), Some(frame));
        assert!((ocean.displacement().current_vertical() - 1.55).abs() < 1e-4);
        // Frame 240 is the top of the climb.
        assert!(ocean.frame().scale.scale > 8.0);
        assert!(ocean.viewer().height_above_water() > 100.0);
    }
}
