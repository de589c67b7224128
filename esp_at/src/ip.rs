//! TCP/UDP commands, single connection mode only.

use heapless::Vec;

use crate::{
    commands::{ip, reply_tag},
    helpers::{LossyStr, SliceExt, WHITESPACE},
    parser,
    response::{Line, Lines},
    Arg, Client, Clock, Error, Failure, Transport,
};

/// Largest payload a single `AT+CIPSEND` accepts.
pub const MAX_PAYLOAD_LEN: usize = 2048;

/// Links reported by `AT+CIPSTATUS` at most.
pub const MAX_LINKS: usize = 5;

/// Longest textual IP address, IPv6 included.
pub const MAX_IP_LEN: usize = 39;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }

    fn parse(field: &[u8]) -> Option<Self> {
        match field.trim(WHITESPACE).unquote() {
            b"TCP" => Some(Protocol::Tcp),
            b"UDP" => Some(Protocol::Udp),
            _ => None,
        }
    }
}

/// An open connection as listed by `AT+CIPSTATUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: u8,
    pub protocol: Protocol,
    pub remote_ip: Vec<u8, MAX_IP_LEN>,
    pub remote_port: u16,
    /// Only reported by newer firmware
    pub local_port: Option<u16>,
    /// The module accepted this connection as a server
    pub server: bool,
}

impl Link {
    /// `<id>,"<type>","<ip>",<port>[,<local port>],<tetype>`
    fn parse(record: &[u8]) -> Option<Self> {
        let fields: Vec<&[u8], 6> = parser::fields(record)?;
        let (id, protocol, ip, port, local_port, tetype) = match fields.as_slice() {
            [id, protocol, ip, port, tetype] => (id, protocol, ip, port, None, tetype),
            [id, protocol, ip, port, local, tetype] => {
                (id, protocol, ip, port, Some(parser::port(local)?), tetype)
            }
            _ => return None,
        };

        Some(Self {
            id: parser::small(id)?,
            protocol: Protocol::parse(protocol)?,
            remote_ip: Vec::from_slice(ip.trim(WHITESPACE).unquote()).ok()?,
            remote_port: parser::port(port)?,
            local_port,
            server: parser::small(tetype)? == 1,
        })
    }
}

/// Reply of `AT+CIPSTATUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// 2: got IP, 3: connected, 4: disconnected
    pub status: u8,
    pub links: Vec<Link, MAX_LINKS>,
}

impl ConnectionStatus {
    fn parse(lines: &[Line]) -> Result<Self, Error> {
        let (first, rest) = lines.split_first().ok_or(Error::Parse)?;
        let status = parser::tagged("STATUS", first.trim(WHITESPACE))
            .and_then(parser::small)
            .ok_or(Error::Parse)?;

        let mut links = Vec::new();
        for line in rest {
            let link = parser::tagged(reply_tag(ip::STATUS), line.trim(WHITESPACE))
                .and_then(Link::parse);
            match link {
                Some(link) => links.push(link).map_err(|_| Error::Overflow)?,
                None => debug!("Skipping link entry {:?}", LossyStr(line)),
            }
        }
        Ok(Self { status, links })
    }
}

pub fn get_connection_status<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
) -> Result<ConnectionStatus, Error> {
    let lines = client.execute(ip::STATUS, None)?;
    ConnectionStatus::parse(&lines)
}

/// Open the single TCP or UDP connection.
pub fn start_connection<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
    protocol: Protocol,
    dest_ip: &str,
    dest_port: u16,
) -> Result<(), Error> {
    client.set(
        ip::START,
        &[
            Arg::Text(protocol.as_str()),
            Arg::Text(dest_ip),
            Arg::from(dest_port),
        ],
        None,
    )?;
    Ok(())
}

/// Send `data` over the open connection.
pub fn send<T: Transport, C: Clock>(client: &mut Client<T, C>, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Err(Failure::EmptyPayload.into());
    }
    if data.len() > MAX_PAYLOAD_LEN {
        return Err(Failure::PayloadTooLarge(data.len()).into());
    }

    client.set(ip::SEND, &[Arg::Int(data.len() as i64)], None)?;
    client.transmit(data, None)?;
    Ok(())
}

pub fn close_connection<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<(), Error> {
    client.execute(ip::CLOSE, None)?;
    Ok(())
}

/// Addresses of the station and soft access point interfaces.
pub fn get_local_ip<T: Transport, C: Clock>(client: &mut Client<T, C>) -> Result<Lines, Error> {
    client.execute(ip::GET_LOCAL_IP, None)
}

/// Ping `destination`, an IP address or host name. Returns the round trip
/// time in milliseconds.
pub fn ping<T: Transport, C: Clock>(
    client: &mut Client<T, C>,
    destination: &str,
) -> Result<u32, Error> {
    let lines = client.set(ip::PING, &[Arg::Text(destination)], None)?;
    lines
        .iter()
        .find_map(|line| parser::plus_number(line))
        .ok_or(Error::Parse)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mock::setup, CommandError, Config};

    #[test]
    fn status_without_links() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIPSTATUS", "STATUS:2", "", "OK"]);

        let status = get_connection_status(&mut client).unwrap();

        assert_eq!(status.status, 2);
        assert!(status.links.is_empty());
    }

    #[test]
    fn status_with_links() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&[
            "AT+CIPSTATUS",
            "STATUS:3",
            "+CIPSTATUS:0,\"TCP\",\"10.0.0.1\",80,0",
            "+CIPSTATUS:1,\"UDP\",\"10.0.0.2\",5000,4000,1",
            "+CIPSTATUS:2,\"ICMP\",\"10.0.0.3\",1,0",
            "",
            "OK",
        ]);

        let status = get_connection_status(&mut client).unwrap();

        assert_eq!(status.status, 3);
        assert_eq!(status.links.len(), 2);
        assert_eq!(
            status.links[0],
            Link {
                id: 0,
                protocol: Protocol::Tcp,
                remote_ip: Vec::from_slice(b"10.0.0.1").unwrap(),
                remote_port: 80,
                local_port: None,
                server: false,
            }
        );
        assert_eq!(status.links[1].protocol, Protocol::Udp);
        assert_eq!(status.links[1].local_port, Some(4000));
        assert!(status.links[1].server);
    }

    #[test]
    fn status_garbage() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIPSTATUS", "busy p...", "", "OK"]);

        assert_eq!(get_connection_status(&mut client), Err(Error::Parse));
    }

    #[test]
    fn starts_connection() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIPSTART=\"TCP\",\"10.0.0.1\",80", "CONNECT", "", "OK"]);

        start_connection(&mut client, Protocol::Tcp, "10.0.0.1", 80).unwrap();
        assert_eq!(probe.written(), ["AT+CIPSTART=\"TCP\",\"10.0.0.1\",80\r\n"]);
    }

    #[test]
    fn sends_payload() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIPSEND=5", "", "OK"]);
        probe.reply(&[(0, "> "), (0, "Recv 5 bytes"), (0, ""), (30, "SEND OK")]);

        send(&mut client, b"hello").unwrap();
        assert_eq!(probe.written(), ["AT+CIPSEND=5\r\n", "hello"]);
    }

    #[test]
    fn payload_bounds() {
        let (mut client, probe) = setup(Config::new());
        let big = [b'x'; MAX_PAYLOAD_LEN + 1];

        assert_eq!(
            send(&mut client, b""),
            Err(Error::Failure(Failure::EmptyPayload))
        );
        assert_eq!(
            send(&mut client, &big),
            Err(Error::Failure(Failure::PayloadTooLarge(MAX_PAYLOAD_LEN + 1)))
        );
        assert!(probe.written().is_empty());
    }

    #[test]
    fn send_without_connection() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIPSEND=5", "link is not", "", "ERROR"]);

        assert_eq!(
            send(&mut client, b"hello"),
            Err(Error::Command(CommandError::Rejected))
        );
        assert_eq!(probe.written().len(), 1);
    }

    #[test]
    fn closes_connection() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIPCLOSE", "", "OK"]);

        close_connection(&mut client).unwrap();
        assert_eq!(probe.written(), ["AT+CIPCLOSE\r\n"]);
    }

    #[test]
    fn local_ip() {
        let (mut client, probe) = setup(Config::new());
        probe.reply_now(&["AT+CIFSR", "192.168.4.1", "10.0.0.5", "", "OK"]);

        let lines = get_local_ip(&mut client).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].as_slice(), b"10.0.0.5");
    }

    #[test]
    fn ping_round_trip() {
        let (mut client, probe) = setup(Config::new());
        probe.reply(&[(0, "AT+PING=\"10.0.0.1\""), (40, "+12"), (40, ""), (40, "OK")]);

        assert_eq!(ping(&mut client, "10.0.0.1"), Ok(12));
        assert_eq!(probe.written(), ["AT+PING=\"10.0.0.1\"\r\n"]);
    }

    #[test]
    fn ping_timeout() {
        let (mut client, probe) = setup(Config::new());
        probe.reply(&[(0, "AT+PING=\"10.9.9.9\""), (1500, "+timeout"), (1500, ""), (1500, "ERROR")]);

        assert_eq!(
            ping(&mut client, "10.9.9.9"),
            Err(Error::Command(CommandError::Rejected))
        );
    }
}
