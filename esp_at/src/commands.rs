//! Command mnemonics of the ESP8266 AT firmware (0.9.x command set),
//! grouped by subsystem.
//!
//! Each group also carries a lookup table from symbolic name to mnemonic.

pub mod generic {
    pub const TEST_AT: &str = "AT";
    pub const RESET: &str = "AT+RST";
    pub const VERSION_INFO: &str = "AT+GMR";
    pub const DEEP_SLEEP: &str = "AT+GSLP";
    pub const ECHO: &str = "ATE";
    pub const FACTORY_RESET: &str = "AT+RESTORE";
    pub const UART_CONFIG: &str = "AT+UART";

    pub const TABLE: &[(&str, &str)] = &[
        ("TEST_AT", TEST_AT),
        ("RESET", RESET),
        ("VERSION_INFO", VERSION_INFO),
        ("DEEP_SLEEP", DEEP_SLEEP),
        ("ECHO", ECHO),
        ("FACTORY_RESET", FACTORY_RESET),
        ("UART_CONFIG", UART_CONFIG),
    ];
}

pub mod wifi {
    pub const MODE: &str = "AT+CWMODE";
    pub const CONNECT: &str = "AT+CWJAP";
    pub const LIST_APS: &str = "AT+CWLAP";
    pub const DISCONNECT: &str = "AT+CWQAP";
    pub const AP_SET_PARAMS: &str = "AT+CWSAP";
    pub const AP_LIST_CLIENTS: &str = "AT+CWLIF";
    pub const AP_DHCP: &str = "AT+CWDHCP";
    pub const AUTO_CONNECT: &str = "AT+CWAUTOCONN";
    pub const SET_STATION_MAC: &str = "AT+CIPSTAMAC";
    pub const SET_AP_MAC: &str = "AT+CIPAPMAC";
    pub const SET_STATION_IP: &str = "AT+CIPSTA";
    pub const SET_AP_IP: &str = "AT+CIPAP";

    pub const TABLE: &[(&str, &str)] = &[
        ("MODE", MODE),
        ("CONNECT", CONNECT),
        ("LIST_APS", LIST_APS),
        ("DISCONNECT", DISCONNECT),
        ("AP_SET_PARAMS", AP_SET_PARAMS),
        ("AP_LIST_CLIENTS", AP_LIST_CLIENTS),
        ("AP_DHCP", AP_DHCP),
        ("AUTO_CONNECT", AUTO_CONNECT),
        ("SET_STATION_MAC", SET_STATION_MAC),
        ("SET_AP_MAC", SET_AP_MAC),
        ("SET_STATION_IP", SET_STATION_IP),
        ("SET_AP_IP", SET_AP_IP),
    ];
}

pub mod ip {
    pub const STATUS: &str = "AT+CIPSTATUS";
    pub const START: &str = "AT+CIPSTART";
    pub const SEND: &str = "AT+CIPSEND";
    pub const CLOSE: &str = "AT+CIPCLOSE";
    pub const GET_LOCAL_IP: &str = "AT+CIFSR";
    pub const SET_MUX_MODE: &str = "AT+CIPMUX";
    pub const CONFIG_SERVER: &str = "AT+CIPSERVER";
    pub const SET_TX_MODE: &str = "AT+CIPMODE";
    pub const SET_TCP_SERVER_TIMEOUT: &str = "AT+CIPSTO";
    pub const UPGRADE: &str = "AT+CIUPDATE";
    pub const PING: &str = "AT+PING";

    pub const TABLE: &[(&str, &str)] = &[
        ("STATUS", STATUS),
        ("START", START),
        ("SEND", SEND),
        ("CLOSE", CLOSE),
        ("GET_LOCAL_IP", GET_LOCAL_IP),
        ("SET_MUX_MODE", SET_MUX_MODE),
        ("CONFIG_SERVER", CONFIG_SERVER),
        ("SET_TX_MODE", SET_TX_MODE),
        ("SET_TCP_SERVER_TIMEOUT", SET_TCP_SERVER_TIMEOUT),
        ("UPGRADE", UPGRADE),
        ("PING", PING),
    ];
}

/// Subsystem a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Namespace {
    Generic,
    Wifi,
    Ip,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Generic, Namespace::Wifi, Namespace::Ip];

    pub const fn name(self) -> &'static str {
        match self {
            Namespace::Generic => "generic",
            Namespace::Wifi => "wifi",
            Namespace::Ip => "ip",
        }
    }

    pub const fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Namespace::Generic => generic::TABLE,
            Namespace::Wifi => wifi::TABLE,
            Namespace::Ip => ip::TABLE,
        }
    }

    /// Mnemonic registered under `name` in this namespace.
    pub fn lookup(self, name: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, cmd)| *cmd)
    }
}

/// Search all namespaces for `name`, either as `NAME` or `NAMESPACE.NAME`
/// (e.g. `wifi.MODE`).
pub fn lookup(name: &str) -> Option<&'static str> {
    if let Some((ns, name)) = name.split_once('.') {
        return Namespace::ALL
            .into_iter()
            .find(|n| n.name().eq_ignore_ascii_case(ns))
            .and_then(|n| n.lookup(name));
    }
    Namespace::ALL.iter().find_map(|ns| ns.lookup(name))
}

/// The mnemonic without its `AT` prefix, as used to tag replies
/// (`AT+CWLAP` replies with `+CWLAP:`).
pub fn reply_tag(cmd: &str) -> &str {
    cmd.strip_prefix("AT").unwrap_or(cmd)
}
