#[cfg(feature = "gui")]
fn main() {
    use dmg::gpu::{SCREEN_H, SCREEN_W};
    use dmg::joypad::JoypadKey;
    use dmg::motherboard::MotherBoard;

    rog::reg("dmg");
    rog::reg("dmg::cartridge");

    let mut rom = String::from("");
    let mut c_test = false;
    let mut c_scale = 2;
    {
        let mut ap = argparse::ArgumentParser::new();
        ap.set_description("Game Boy (DMG) emulator");
        ap.refer(&mut c_test).add_option(
            &["--test"],
            argparse::StoreTrue,
            "Print cartridge header information and exit",
        );
        ap.refer(&mut c_scale).add_option(
            &["-x", "--scale-factor"],
            argparse::Store,
            "Scale the video by a factor of 1, 2, 4, or 8",
        );
        ap.refer(&mut rom).add_argument("rom", argparse::Store, "Rom name");
        ap.parse_args_or_exit();
    }

    let data = match std::fs::read(&rom) {
        Ok(ok) => ok,
        Err(e) => {
            rog::println!("Failed to read rom {}: {}", rom, e);
            std::process::exit(1);
        }
    };
    let sav_path = std::path::PathBuf::from(&rom).with_extension("sav");
    let mut mbrd = MotherBoard::power_up(data, sav_path);

    if c_test {
        let cart = &mbrd.mmu.cartridge;
        println!("Title: {}", cart.title());
        println!("MBC Type: {}", cart.type_name());
        println!("ROM Size: {} Bytes", cart.rom_size());
        println!("RAM Size: {} Bytes", cart.ram_size());
        return;
    }

    let mut option = minifb::WindowOptions::default();
    option.resize = true;
    option.scale = match c_scale {
        1 => minifb::Scale::X1,
        2 => minifb::Scale::X2,
        4 => minifb::Scale::X4,
        8 => minifb::Scale::X8,
        _ => panic!("Supported scale: 1, 2, 4 or 8"),
    };
    let rom_name = mbrd.mmu.cartridge.title();
    let mut window =
        minifb::Window::new(format!("Game Boy - {}", rom_name).as_str(), SCREEN_W, SCREEN_H, option).unwrap();
    let mut window_buffer = vec![0x00; SCREEN_W * SCREEN_H];
    window.update_with_buffer(window_buffer.as_slice()).unwrap();

    let keys = [
        (minifb::Key::Right, JoypadKey::Right),
        (minifb::Key::Left, JoypadKey::Left),
        (minifb::Key::Up, JoypadKey::Up),
        (minifb::Key::Down, JoypadKey::Down),
        (minifb::Key::Z, JoypadKey::A),
        (minifb::Key::X, JoypadKey::B),
        (minifb::Key::Space, JoypadKey::Select),
        (minifb::Key::Enter, JoypadKey::Start),
    ];

    loop {
        // Stop if the GUI is closed by the user.
        if !window.is_open() {
            break;
        }

        // One instruction, then the PPU and timer catch up.
        mbrd.do_cycle();

        // Hand the finished frame to the window and poll the keyboard once
        // per frame.
        if mbrd.check_and_reset_gpu_updated() {
            let mut i: usize = 0;
            for l in mbrd.mmu.gpu.data.iter() {
                for w in l.iter() {
                    let r = u32::from(w[0]) << 16;
                    let g = u32::from(w[1]) << 8;
                    let b = u32::from(w[2]);

                    window_buffer[i] = 0xff00_0000 | r | g | b;
                    i += 1;
                }
            }
            window.update_with_buffer(window_buffer.as_slice()).unwrap();

            if window.is_key_down(minifb::Key::Escape) {
                break;
            }
            for (rk, vk) in &keys {
                if window.is_key_down(*rk) {
                    mbrd.keydown(*vk);
                } else {
                    mbrd.keyup(*vk);
                }
            }
        }
    }
    // Dropping the motherboard persists battery-backed cartridge ram.
}

#[cfg(not(feature = "gui"))]
fn main() {
    rog::println!("Built without the gui feature; nothing to run");
}
