use clap::Parser;
use dialoguer::Select;
use phasorgate::{
    logging,
    pins::{MemoryPins, PinDriver, SysfsPins},
    timeline::{list_input_ports, InternalTimeline, MidiClockTimeline},
    validate_device, Args, Engine, GateError, Settings, Timeline,
};

fn main() {
    let args = parse_command_line_arguments();

    if args.list_midi_inputs {
        list_midi_inputs();
        return;
    }

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn list_midi_inputs() {
    match list_input_ports() {
        Ok(devices) => {
            println!("Available MIDI input devices:");
            for device in devices {
                println!("  - {}", device);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn load_settings(args: &Args) -> phasorgate::Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply_to(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn run(args: &Args) -> phasorgate::Result<()> {
    let settings = load_settings(args)?;
    logging::init_logger(&settings)?;
    log::info!("Application starting");
    log::debug!("Settings: {:?}", settings);

    let run_for = args.run_duration().map_err(GateError::Config)?;
    let timeline = create_timeline(args, &settings)?;
    let pins = create_pins(args, &settings);

    let engine = Engine::new(settings, timeline, pins)?.with_status_display(!args.quiet);
    engine.configure_pins()?;
    if args.cue_on_start {
        engine.transport().press();
    }

    if !args.quiet {
        println!("Press the transport button to cue a start; Ctrl+C to exit.");
    }
    engine.run(run_for)
}

fn create_timeline(args: &Args, settings: &Settings) -> phasorgate::Result<Box<dyn Timeline>> {
    let device = if args.choose_midi_input {
        Some(choose_midi_input()?)
    } else {
        args.midi_clock.clone()
    };

    match device {
        Some(device_name) => {
            let devices = list_input_ports()?;
            validate_device(&device_name, &devices).map_err(GateError::Midi)?;
            let timeline = MidiClockTimeline::connect(&device_name)?;
            log::info!("Following MIDI clock from {}", device_name);
            Ok(Box::new(timeline))
        }
        None => {
            log::info!("Using internal timeline at {} BPM", settings.tempo);
            Ok(Box::new(InternalTimeline::new(settings.tempo)))
        }
    }
}

fn choose_midi_input() -> phasorgate::Result<String> {
    let devices = list_input_ports()?;
    if devices.is_empty() {
        return Err(GateError::Midi("no MIDI input devices available".to_string()));
    }

    let selection = Select::new()
        .with_prompt("MIDI clock source")
        .items(&devices)
        .default(0)
        .interact()
        .map_err(|e| GateError::Midi(e.to_string()))?;
    Ok(devices[selection].clone())
}

fn create_pins(args: &Args, settings: &Settings) -> Box<dyn PinDriver> {
    if args.dry_run {
        log::info!("Dry run: pin levels stay in memory");
        Box::new(MemoryPins::new())
    } else {
        Box::new(SysfsPins::new(settings.gpio_root.clone()))
    }
}
