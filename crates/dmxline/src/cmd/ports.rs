use dmxline_sender::{configure, try_list_compatible_ports};
use dmxline_transport::{LineSettings, SystemPort};
use tracing::debug;

use crate::cmd::PortsArgs;
use crate::exit::{sender_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat, PortStatus};

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = if args.all {
        probe_all_ports()?
    } else {
        try_list_compatible_ports()
            .map_err(|err| sender_error("port enumeration failed", err))?
            .into_iter()
            .map(|name| PortStatus {
                name,
                compatible: true,
                reason: None,
            })
            .collect()
    };

    print_ports(&ports, &LineSettings::DMX512.to_string(), format);
    Ok(SUCCESS)
}

/// Validate every enumerated port, keeping the failures with their reason.
fn probe_all_ports() -> CliResult<Vec<PortStatus>> {
    let names = SystemPort::enumerate()
        .map_err(|err| transport_error("port enumeration failed", err))?;

    Ok(names
        .into_iter()
        .map(|name| match configure(SystemPort::new(name.as_str())) {
            Ok(_) => PortStatus {
                name,
                compatible: true,
                reason: None,
            },
            Err(err) => {
                debug!(port = %name, error = %err, "port failed validation");
                PortStatus {
                    name,
                    compatible: false,
                    reason: Some(err.to_string()),
                }
            }
        })
        .collect())
}
