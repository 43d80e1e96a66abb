// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use mooltipass_hid::hid_commands::*;

    fn battery_payload() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(&1u32.to_le_bytes()); // power source
        data.extend(&1u32.to_le_bytes()); // charging
        data.extend(&3100u16.to_le_bytes()); // main ADC
        data.extend(&2u16.to_le_bytes()); // aux charge status
        data.extend(&4150u16.to_le_bytes()); // aux battery voltage
        data.extend(&(-120i16).to_le_bytes()); // aux charge current
        data.extend(&3300u16.to_le_bytes()); // stepdown voltage
        data.extend(&0x01FFu16.to_le_bytes()); // DAC register
        data
    }

    #[test]
    fn test_battery_status_request_payload() {
        let request = GetBatteryStatus::new()
            .start_charging(true)
            .switch_to_battery_screen_power(true)
            .force_charge_voltage(0x1234);

        assert_eq!(request.payload(), vec![1, 0, 0, 1, 0x34, 0x12, 0]);
        assert_eq!(request.command(), HidCommand::DbgGetBatteryStatus);
    }

    #[test]
    fn test_battery_status_request_default() {
        let packet = GetBatteryStatus::new().to_packet();

        assert_eq!(packet.command(), 0x800C);
        assert_eq!(packet.payload(), &[0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_battery_status_request_all_flags() {
        let request = GetBatteryStatus::new()
            .start_charging(true)
            .stop_charging(true)
            .switch_to_usb_screen_power(true)
            .switch_to_battery_screen_power(true)
            .force_charge_voltage(0xFF00)
            .stop_force_charge(true);

        assert_eq!(request.payload(), vec![1, 1, 1, 1, 0x00, 0xFF, 1]);
    }

    #[test]
    fn test_ping_payload() {
        let packet = Ping::new([1, 2, 3, 4]).to_packet();

        assert_eq!(packet.command(), HidCommand::Ping as u16);
        assert_eq!(packet.payload(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_build_ping_packet() {
        let packets: Vec<_> = (0..8).map(|_| build_ping_packet()).collect();

        for packet in &packets {
            assert_eq!(packet.command(), 0x0001);
            assert_eq!(packet.length(), 4);
            assert_eq!(packet.payload().len(), 4);
        }
        // 8 draws of 32 random bits colliding on every pair is not a realistic outcome
        assert!(packets.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_battery_status_from_buffer() {
        let status = BatteryStatus::from_buffer(&battery_payload()).unwrap();

        assert_eq!(status.power_source, 1);
        assert!(status.is_charging());
        assert_eq!(status.main_adc_battery_value, 3100);
        assert_eq!(status.aux_charge_status, 2);
        assert_eq!(status.aux_battery_voltage, 4150);
        assert_eq!(status.aux_charge_current, -120);
        assert_eq!(status.aux_stepdown_voltage, 3300);
        assert_eq!(status.aux_dac_register_val, 0x01FF);
    }

    #[test]
    fn test_battery_status_too_short() {
        let mut data = battery_payload();
        data.pop();

        match BatteryStatus::from_buffer(&data).unwrap_err() {
            HidMessageError::InvalidLength { expected, actual } => {
                assert_eq!(expected, 20);
                assert_eq!(actual, 19);
            }
            _ => panic!("Expected InvalidLength error"),
        }
    }

    #[test]
    fn test_battery_status_json() {
        let status = BatteryStatus::from_buffer(&battery_payload()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&status).unwrap();

        assert_eq!(json["aux_battery_voltage"], 4150);
        assert_eq!(json["aux_charge_current"], -120);
    }

    #[test]
    fn test_command_from_u16() {
        assert_eq!(HidCommand::try_from(0x0001).unwrap(), HidCommand::Ping);
        assert_eq!(HidCommand::try_from(0x800C).unwrap(), HidCommand::DbgGetBatteryStatus);

        match HidCommand::try_from(0xBEEF).unwrap_err() {
            HidMessageError::UnknownCommand(cmd) => assert_eq!(cmd, 0xBEEF),
            _ => panic!("Expected UnknownCommand error"),
        }
    }

    #[test]
    fn test_command_display() {
        assert_eq!(format!("{}", HidCommand::DbgGetBatteryStatus), "Debug Get Battery Status");
    }
