//! Wi-Fi station and soft access point commands.

use embassy_time::Duration;
use heapless::Vec;

use crate::{
    commands::{reply_tag, wifi},
    helpers::{LossyStr, SliceExt, WHITESPACE},
    parser,
    response::{Line, MAX_LINES},
    system, Arg, Client, Clock, Error, Failure, Transport,
};

/// Joining a network takes a while, mostly for DHCP.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Longest SSID allowed by 802.11.
pub const MAX_SSID_LEN: usize = 32;

pub const MAX_PASSWORD_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;

/// `aa:bb:cc:dd:ee:ff`
pub const MAC_LEN: usize = 17;

/// Most access points kept from a single scan: every body line of a full
/// reply.
pub const MAX_ACCESS_POINTS: usize = MAX_LINES - 3;

pub type Ssid = Vec<u8, MAX_SSID_LEN>;
pub type AccessPoints = Vec<AccessPoint, MAX_ACCESS_POINTS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiMode {
    Station = 1,
    AccessPoint = 2,
    AccessPointAndStation = 3,
}

impl WifiMode {
    pub const ALL: [WifiMode; 3] = [
        WifiMode::Station,
        WifiMode::AccessPoint,
        WifiMode::AccessPointAndStation,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            WifiMode::Station => "Station",
            WifiMode::AccessPoint => "Access Point",
            WifiMode::AccessPointAndStation => "Access Point + Station",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Whether the soft access point is running in this mode.
    pub const fn serves_access_point(self) -> bool {
        matches!(
            self,
            WifiMode::AccessPoint | WifiMode::AccessPointAndStation
        )
    }
}

impl TryFrom<i32> for WifiMode {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(WifiMode::Station),
            2 => Ok(WifiMode::AccessPoint),
            3 => Ok(WifiMode::AccessPointAndStation),
            other => Err(Error::UnknownMode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encryption {
    Open = 0,
    Wep = 1,
    WpaPsk = 2,
    Wpa2Psk = 3,
    WpaWpa2Psk = 4,
}

impl Encryption {
    pub const fn name(self) -> &'static str {
        match self {
            Encryption::Open => "OPEN",
            Encryption::Wep => "WEP",
            Encryption::WpaPsk => "WPA_PSK",
            Encryption::Wpa2Psk => "WPA2_PSK",
            Encryption::WpaWpa2Psk => "WPA_WPA2_PSK",
        }
    }
}

impl TryFrom<u8> for Encryption {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Encryption::Open,
            1 => Encryption::Wep,
            2 => Encryption::WpaPsk,
            3 => Encryption::Wpa2Psk,
            4 => Encryption::WpaWpa2Psk,
            _ => return Err(Error::Parse),
        })
    }
}

/// One entry of an access point scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub encryption_protocol: Encryption,
    pub ssid: Ssid,
    /// RSSI in dBm
    pub signal_strength: i32,
    pub mac_address: Vec<u8, MAC_LEN>,
    pub channel: u8,
}

impl AccessPoint {
    /// Parse the five comma separated fields of a scan entry, e.g.
    /// `0,"ssid",-55,"aa:bb:cc:dd:ee:ff",6`.
    ///
    /// Anything but exactly five well formed fields yields `None`.
    pub fn parse(record: &[u8]) -> Option<Self> {
        let fields: Vec<&[u8], 5> = parser::fields(record)?;
        let [ecn, ssid, rssi, mac, channel] = fields.as_slice() else {
            return None;
        };

        Some(Self {
            encryption_protocol: Encryption::try_from(parser::small(ecn)?).ok()?,
            ssid: Vec::from_slice(ssid.trim(WHITESPACE).unquote()).ok()?,
            signal_strength: parser::int(rssi)?,
            mac_address: Vec::from_slice(mac.trim(WHITESPACE).unquote()).ok()?,
            channel: parser::small(channel)?,
        })
    }
}

/// Settings of the soft access point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointConfig {
    pub ssid: Ssid,
    pub password: Vec<u8, MAX_PASSWORD_LEN>,
    pub channel: u8,
    pub encryption: Encryption,
}

impl AccessPointConfig {
    /// Parse `+CWSAP:"ssid","password",<channel>,<encryption>`.
    fn parse(line: &[u8]) -> Option<Self> {
        let fields: Vec<&[u8], 4> = parser::fields(parser::after_colon(line)?)?;
        let [ssid, password, channel, ecn] = fields.as_slice() else {
            return None;
        };

        Some(Self {
            ssid: Vec::from_slice(ssid.trim(WHITESPACE).unquote()).ok()?,
            password: Vec::from_slice(password.trim(WHITESPACE).unquote()).ok()?,
            channel: parser::small(channel)?,
            encryption: Encryption::try_from(parser::small(ecn)?).ok()?,
        })
    }
}

pub fn get_mode<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<WifiMode, Error> {
    let line = client.query(wifi::MODE, None)?;
    let mode = parser::after_colon(&line)
        .and_then(parser::int)
        .ok_or(Error::Parse)?;
    WifiMode::try_from(mode)
}

pub fn set_mode<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
    mode: WifiMode,
) -> Result<(), Error> {
    client.set(wifi::MODE, &[Arg::Int(mode as i64)], None)?;
    Ok(())
}

/// SSID of the network the station is joined to, `None` when disconnected.
pub fn get_access_point<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
) -> Result<Option<Ssid>, Error> {
    let line = client.query(wifi::CONNECT, None)?;
    if line.as_slice() == b"No AP" {
        return Ok(None);
    }

    let value = parser::tagged(reply_tag(wifi::CONNECT), &line).ok_or(Error::Parse)?;
    let (_, ssid) = parser::quoted(value).map_err(|_| Error::Parse)?;
    Ok(Some(Vec::from_slice(ssid).map_err(|_| Error::Overflow)?))
}

pub fn connect<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
    ssid: &str,
    psk: &str,
) -> Result<(), Error> {
    info!("Joining network {:?}", LossyStr(ssid.as_bytes()));
    client.set(
        wifi::CONNECT,
        &[Arg::Text(ssid), Arg::Text(psk)],
        Some(CONNECT_TIMEOUT),
    )?;
    Ok(())
}

pub fn disconnect<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<(), Error> {
    client.execute(wifi::DISCONNECT, None)?;
    Ok(())
}

/// Scan for access points matching `filter`, e.g. an SSID, optionally
/// followed by a MAC address and a channel.
pub fn list_access_points<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
    filter: &[Arg<'_>],
) -> Result<AccessPoints, Error> {
    if filter.is_empty() {
        return list_all_access_points(client);
    }
    let lines = client.set(wifi::LIST_APS, filter, None)?;
    Ok(parse_scan(&lines))
}

/// Scan for every access point in range.
///
/// Some firmware versions sporadically emit mangled entries, those are
/// skipped.
pub fn list_all_access_points<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
) -> Result<AccessPoints, Error> {
    let lines = client.execute(wifi::LIST_APS, None)?;
    Ok(parse_scan(&lines))
}

fn scan_record(line: &[u8]) -> Option<&[u8]> {
    match parser::tagged(reply_tag(wifi::LIST_APS), line.trim(WHITESPACE))? {
        [b'(', inner @ .., b')'] => Some(inner),
        _ => None,
    }
}

fn parse_scan(lines: &[Line]) -> AccessPoints {
    let mut aps = AccessPoints::new();
    for line in lines {
        match scan_record(line).and_then(AccessPoint::parse) {
            Some(ap) => {
                if aps.push(ap).is_err() {
                    warn!("Access point list full, dropping {:?}", LossyStr(line));
                }
            }
            None => debug!("Skipping access point entry {:?}", LossyStr(line)),
        }
    }
    aps
}

fn require_access_point_mode<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
) -> Result<(), Error> {
    let mode = get_mode(client)?;
    if !mode.serves_access_point() {
        return Err(Failure::WrongMode(mode).into());
    }
    Ok(())
}

fn validate_access_point_config(
    password: &str,
    channel: u8,
    encryption: Encryption,
) -> Result<(), Failure> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(Failure::InvalidPassword(len));
    }
    if !(1..=14).contains(&channel) {
        return Err(Failure::InvalidChannel(channel));
    }
    if encryption == Encryption::Wep {
        return Err(Failure::InvalidEncryption(encryption));
    }
    Ok(())
}

/// Configure the soft access point, then reset the module to apply it.
///
/// The module has to be in [`WifiMode::AccessPoint`] or
/// [`WifiMode::AccessPointAndStation`].
pub fn set_access_point_config<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
    ssid: &str,
    password: &str,
    channel: u8,
    encryption: Encryption,
) -> Result<(), Error> {
    require_access_point_mode(client)?;
    validate_access_point_config(password, channel, encryption)?;

    client.set(
        wifi::AP_SET_PARAMS,
        &[
            Arg::Text(ssid),
            Arg::Text(password),
            Arg::from(channel),
            Arg::Int(encryption as i64),
        ],
        None,
    )?;
    system::reset(client)
}

pub fn get_access_point_config<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
) -> Result<AccessPointConfig, Error> {
    require_access_point_mode(client)?;
    let line = client.query(wifi::AP_SET_PARAMS, None)?;
    AccessPointConfig::parse(&line).ok_or(Error::Parse)
}
