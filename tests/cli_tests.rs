#[cfg(test)]
mod tests {
    use clap::Parser;
    use phasorgate::pulse::PulseWidth;
    use phasorgate::*;
    use std::time::Duration;

    #[test]
    fn test_args_default_to_internal_timeline() {
        let args = Args::parse_from(["test"]);
        assert_eq!(args.midi_clock, None);
        assert!(!args.list_midi_inputs);
        assert!(!args.dry_run);
        assert_eq!(args.run_duration().unwrap(), None);
    }

    #[test]
    fn test_overrides_apply_to_settings() {
        let args = Args::parse_from([
            "test",
            "--pulses-per-beat",
            "4",
            "--pulse-width-seconds",
            "0.01",
            "--quantum",
            "8",
            "--clock-pin",
            "5",
            "--button-pin",
            "6",
        ]);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);

        assert_eq!(settings.pulses_per_beat, 4.0);
        assert_eq!(settings.pulse_width(), PulseWidth::Seconds(0.01));
        assert_eq!(settings.quantum, 8.0);
        assert_eq!(settings.pins.clock, 5);
        assert_eq!(settings.pins.button, 6);
        assert_eq!(settings.pins.reset, 23);
    }

    #[test]
    fn test_fraction_override_selects_percentage_mode() {
        let args = Args::parse_from(["test", "--pulse-width-fraction", "0.5"]);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);
        assert_eq!(settings.pulse_width(), PulseWidth::BeatFraction(0.5));
    }

    #[test]
    fn test_width_flags_conflict() {
        let result = Args::try_parse_from([
            "test",
            "--pulse-width-seconds",
            "0.01",
            "--pulse-width-fraction",
            "0.5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_for_parses_seconds() {
        let args = Args::parse_from(["test", "--run-for", "1.5", "--quiet"]);
        assert_eq!(
            args.run_duration().unwrap(),
            Some(Duration::from_millis(1500))
        );
        assert!(args.quiet);

        let args = Args::parse_from(["test", "--run-for=-1"]);
        assert!(args.run_duration().is_err());
    }

    #[test]
    fn test_device_validation() {
        let devices = vec!["Digitakt MIDI 1".to_string(), "Through Port-0".to_string()];
        assert!(validate_device("Digitakt", &devices).is_ok());

        let error = validate_device("Nonexistent Device", &devices).unwrap_err();
        assert!(error.contains("Nonexistent Device"));
        assert!(error.contains("  - Through Port-0"));
    }
}
