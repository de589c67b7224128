use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use esp_at::{
    commands, ip, system, wifi, Arg, Client, Config, Invocation, LossyStr, SerialTransport,
    SystemClock,
};
use esp_at_demos::serial::Serial;

type Esp = Client<SerialTransport<Serial>, SystemClock>;

#[derive(Parser)]
#[command(name = "smoke-test", about = "Exercise an ESP8266 module attached to a serial port")]
struct Cli {
    /// Serial port the module is attached to
    #[arg(short, long, env = "ESP_AT_PORT")]
    port: String,

    #[arg(short, long, env = "ESP_AT_BAUD", default_value_t = 115_200)]
    baud: u32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the generic and Wi-Fi checks (default)
    Smoke,
    /// Send a command by name, e.g. `wifi.MODE` or `VERSION_INFO`
    Exec {
        name: String,
        /// Send as a query (`cmd?`)
        #[arg(short, long)]
        query: bool,
        /// Set arguments, integers are sent unquoted
        args: Vec<String>,
    },
    /// Print the round trip time to a host
    Ping { destination: String },
    /// List the serial ports of this machine
    Ports,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(Command::Ports) = cli.command {
        for port in serialport::available_ports()? {
            println!("{}", port.port_name);
        }
        return Ok(());
    }

    let serial = Serial::open(&cli.port, cli.baud)
        .with_context(|| format!("Failed to open {}", cli.port))?;
    let mut client = Client::new(SerialTransport::new(serial), SystemClock, Config::new());

    match cli.command {
        None | Some(Command::Smoke) => smoke(&mut client),
        Some(Command::Exec { name, query, args }) => exec(&mut client, &name, query, &args),
        Some(Command::Ping { destination }) => {
            let ms = ip::ping(&mut client, &destination)?;
            println!("{}: {} ms", destination, ms);
            Ok(())
        }
        Some(Command::Ports) => Ok(()),
    }
}

fn report(ok: bool) {
    if ok {
        println!("Success!");
    } else {
        println!("Failed!");
    }
}

fn smoke(client: &mut Esp) -> anyhow::Result<()> {
    println!("Testing generic methods");
    println!("=======================");

    println!("AT startup...");
    report(system::test(client)?);

    println!("Another AT startup...");
    report(system::test(client)?);

    println!();
    println!("Testing WIFI methods");
    println!("====================");

    let mode = wifi::WifiMode::Station;
    println!(
        "Testing get_mode/set_mode of value '{}'({})...",
        mode.name(),
        mode as i32
    );
    wifi::set_mode(client, mode)?;
    report(wifi::get_mode(client)? == mode);

    println!("Disconnecting from WLAN...");
    report(wifi::disconnect(client).is_ok());

    println!("Disconnecting from WLAN again...");
    report(wifi::disconnect(client).is_ok());

    println!("Checking if not connected WLAN...");
    report(wifi::get_access_point(client)?.is_none());

    println!("Scanning for WLANs...");
    for ap in wifi::list_all_access_points(client)? {
        println!("{:?}", ap);
        let Ok(ssid) = core::str::from_utf8(&ap.ssid) else {
            continue;
        };
        println!("Scanning for WLAN '{}'...", ssid);
        for found in wifi::list_access_points(client, &[Arg::Text(ssid)])? {
            println!("{:?}", found);
        }
    }

    println!("Setting access point mode...");
    report(wifi::set_mode(client, wifi::WifiMode::AccessPointAndStation).is_ok());

    Ok(())
}

fn exec(client: &mut Esp, name: &str, query: bool, args: &[String]) -> anyhow::Result<()> {
    let cmd = commands::lookup(name).ok_or_else(|| anyhow!("Unknown command '{}'!", name))?;

    let args: Vec<Arg> = args
        .iter()
        .map(|a| match a.parse::<i64>() {
            Ok(v) => Arg::Int(v),
            Err(_) => Arg::Text(a),
        })
        .collect();

    let invocation = if query {
        Invocation::query(cmd)
    } else if args.is_empty() {
        Invocation::execute(cmd)
    } else {
        Invocation::set(cmd, &args)
    };

    for line in client.send(&invocation)? {
        println!("{:?}", LossyStr(&line));
    }
    Ok(())
}
