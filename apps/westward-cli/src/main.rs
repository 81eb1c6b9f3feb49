use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::EulerRot;
use tracing_subscriber::EnvFilter;
use westward_common::InstanceSlot;
use westward_input::{BindingSet, Source};
use westward_runtime::{InputScript, RuntimeConfig, Session};

#[derive(Parser)]
#[command(name = "westward-cli", about = "CLI tool for westward input and locomotion")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Validate and describe a binding set
    Bindings {
        /// Binding file (YAML or JSON); the standard set when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Only this action map
        #[arg(short, long)]
        map: Option<String>,
        /// Actions the map must declare, comma separated
        #[arg(long, value_delimiter = ',')]
        require: Vec<String>,
        /// Print the binding set as YAML
        #[arg(long)]
        dump: bool,
    },
    /// Run scripted input through a session and report where the actor ends up
    Simulate {
        /// Runtime config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Input script (YAML); idle frames when omitted
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Idle frames to run without a script
        #[arg(short, long, default_value = "120")]
        ticks: u32,
        /// Print every tick report
        #[arg(long)]
        each: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("westward-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", westward_input::crate_info());
            println!("locomotion: {}", westward_locomotion::crate_info());
            println!("host: {}", westward_host::crate_info());
            println!("runtime: {}", westward_runtime::crate_info());
        }
        Commands::Bindings {
            file,
            map,
            require,
            dump,
        } => {
            let set = match &file {
                Some(path) => BindingSet::load(path)
                    .with_context(|| format!("loading bindings from {}", path.display()))?,
                None => BindingSet::standard(),
            };
            let maps: Vec<_> = match &map {
                Some(name) => vec![
                    set.map(name)
                        .with_context(|| format!("no action map named `{name}`"))?,
                ],
                None => set.maps.iter().collect(),
            };
            for m in maps {
                m.validate(&require)
                    .with_context(|| format!("action map `{}` is invalid", m.name))?;
                println!("{} ({} actions)", m.name, m.actions.len());
                for action in &m.actions {
                    let honor = match &action.honor {
                        Some(families) => families
                            .iter()
                            .map(|f| f.as_str())
                            .collect::<Vec<_>>()
                            .join(","),
                        None => "any".into(),
                    };
                    println!("  {:<14} {:<8} honor={honor}", action.name, action.shape);
                    for source in &action.sources {
                        match source {
                            Source::Control { control } => println!("    {control}"),
                            Source::Composite { composite } => {
                                let parts: Vec<_> = composite.parts().map(|(p, _)| p.to_string()).collect();
                                println!("    composite [{}]", parts.join(" "));
                            }
                        }
                    }
                }
            }
            if dump {
                print!("{}", set.to_yaml_string()?);
            }
        }
        Commands::Simulate {
            config,
            script,
            ticks,
            each,
        } => {
            let config = match &config {
                Some(path) => RuntimeConfig::load(path)?,
                None => RuntimeConfig::default(),
            };
            let bindings = Rc::new(config.load_bindings()?);
            let script = match &script {
                Some(path) => InputScript::load(path)?,
                None => InputScript::idle(ticks),
            };

            tracing::info!(frames = script.frame_count(), "simulating");
            let mut slot = InstanceSlot::new("input dispatcher");
            let mut session = Session::new(config, bindings, &mut slot)?;
            let reports = session.play(&script);

            if each {
                for (i, r) in reports.iter().enumerate() {
                    let horizontal = r
                        .horizontal
                        .map(|h| format!("({:.4}, {:.4}, {:.4})", h.x, h.y, h.z))
                        .unwrap_or_else(|| "-".into());
                    println!(
                        "{i:>5} grounded={} horizontal={horizontal} vertical={:.5} rotated={} degraded={}",
                        r.grounded, r.vertical.y, r.rotated, r.degraded
                    );
                }
            }

            let controller = session.controller();
            let (yaw, _, _) = controller.rotation().to_euler(EulerRot::YXZ);
            let moved = reports.iter().filter(|r| r.horizontal.is_some()).count();
            let degraded = reports.iter().filter(|r| r.degraded).count();
            println!("frames: {}", session.frames());
            let position = session.body().position();
            println!("position: ({:.3}, {:.3}, {:.3})", position.x, position.y, position.z);
            println!("yaw: {:.2} deg, pitch: {:.2} deg", yaw.to_degrees(), controller.pitch());
            println!("vertical velocity: {:.3}", controller.vertical_velocity());
            println!("frames with movement: {moved}, degraded: {degraded}");
            session.shutdown();
        }
    }

    Ok(())
}
