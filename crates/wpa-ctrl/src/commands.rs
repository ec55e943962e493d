//! Command names and event markers understood by the supplicant.
//!
//! Event constants keep their trailing space: the daemon separates the
//! event name from its arguments with one, and subscribers filter on the
//! full name as emitted.

/// Liveness check; answered with `PONG`.
pub const PING: &str = "PING";
/// Registers the sending socket for unsolicited events.
pub const ATTACH: &str = "ATTACH";
/// Stops event delivery to the sending socket.
pub const DETACH: &str = "DETACH";
/// Requests a new scan.
pub const SCAN: &str = "SCAN";
/// Lists the latest scan results.
pub const SCAN_RESULTS: &str = "SCAN_RESULTS";
/// Lists configured networks.
pub const LIST_NETWORKS: &str = "LIST_NETWORKS";
/// Creates an empty network block and returns its id.
pub const ADD_NETWORK: &str = "ADD_NETWORK";
/// Sets one variable of a network block.
pub const SET_NETWORK: &str = "SET_NETWORK";
/// Removes a network block.
pub const REMOVE_NETWORK: &str = "REMOVE_NETWORK";
/// Selects one network and disables the others.
pub const SELECT_NETWORK: &str = "SELECT_NETWORK";
/// Enables a network block.
pub const ENABLE_NETWORK: &str = "ENABLE_NETWORK";
/// Disables a network block.
pub const DISABLE_NETWORK: &str = "DISABLE_NETWORK";
/// Persists the running configuration.
pub const SAVE_CONFIG: &str = "SAVE_CONFIG";
/// Reloads the configuration file.
pub const RECONFIGURE: &str = "RECONFIGURE";
/// Reports the current connection state.
pub const STATUS: &str = "STATUS";
/// Disconnects and waits for `REASSOCIATE`.
pub const DISCONNECT: &str = "DISCONNECT";
/// Reconnects after `DISCONNECT`.
pub const RECONNECT: &str = "RECONNECT";
/// Forces reassociation.
pub const REASSOCIATE: &str = "REASSOCIATE";
/// Stops the daemon.
pub const TERMINATE: &str = "TERMINATE";

/// Credential request marker; the event message of every auth request.
pub const CTRL_REQ: &str = "CTRL-REQ-";
/// Credential response marker.
pub const CTRL_RSP: &str = "CTRL-RSP-";

/// Association completed.
pub const EVENT_CONNECTED: &str = "CTRL-EVENT-CONNECTED ";
/// Disconnected from the network.
pub const EVENT_DISCONNECTED: &str = "CTRL-EVENT-DISCONNECTED ";
/// Associated network was rejected.
pub const EVENT_ASSOC_REJECT: &str = "CTRL-EVENT-ASSOC-REJECT ";
/// The daemon is shutting down.
pub const EVENT_TERMINATING: &str = "CTRL-EVENT-TERMINATING ";
/// A password was changed.
pub const EVENT_PASSWORD_CHANGED: &str = "CTRL-EVENT-PASSWORD-CHANGED ";
/// EAP notification from the server.
pub const EVENT_EAP_NOTIFICATION: &str = "CTRL-EVENT-EAP-NOTIFICATION ";
/// EAP authentication started.
pub const EVENT_EAP_STARTED: &str = "CTRL-EVENT-EAP-STARTED ";
/// EAP method selected.
pub const EVENT_EAP_METHOD: &str = "CTRL-EVENT-EAP-METHOD ";
/// EAP authentication succeeded.
pub const EVENT_EAP_SUCCESS: &str = "CTRL-EVENT-EAP-SUCCESS ";
/// EAP authentication failed.
pub const EVENT_EAP_FAILURE: &str = "CTRL-EVENT-EAP-FAILURE ";
/// A scan started.
pub const EVENT_SCAN_STARTED: &str = "CTRL-EVENT-SCAN-STARTED ";
/// Scan results are available.
pub const EVENT_SCAN_RESULTS: &str = "CTRL-EVENT-SCAN-RESULTS ";
/// A BSS entry was added.
pub const EVENT_BSS_ADDED: &str = "CTRL-EVENT-BSS-ADDED ";
/// A BSS entry was removed.
pub const EVENT_BSS_REMOVED: &str = "CTRL-EVENT-BSS-REMOVED ";
/// No matching network was found.
pub const EVENT_NETWORK_NOT_FOUND: &str = "CTRL-EVENT-NETWORK-NOT-FOUND ";
/// Beacon loss on the current network.
pub const EVENT_BEACON_LOSS: &str = "CTRL-EVENT-BEACON-LOSS ";
/// Channel switch announced.
pub const EVENT_CHANNEL_SWITCH: &str = "CTRL-EVENT-CHANNEL-SWITCH ";
/// Frequencies to avoid changed.
pub const EVENT_AVOID_FREQ: &str = "CTRL-EVENT-AVOID-FREQ ";
/// Regulatory domain changed.
pub const EVENT_REGDOM_CHANGE: &str = "CTRL-EVENT-REGDOM-CHANGE ";

/// A WPS capable access point is in range.
pub const WPS_EVENT_AP_AVAILABLE: &str = "WPS-AP-AVAILABLE ";
/// WPS push button session active on an access point.
pub const WPS_EVENT_AP_AVAILABLE_PBC: &str = "WPS-AP-AVAILABLE-PBC ";
/// WPS PIN session active on an access point.
pub const WPS_EVENT_AP_AVAILABLE_PIN: &str = "WPS-AP-AVAILABLE-PIN ";
/// WPS negotiation succeeded.
pub const WPS_EVENT_SUCCESS: &str = "WPS-SUCCESS ";
/// WPS negotiation failed.
pub const WPS_EVENT_FAIL: &str = "WPS-FAIL ";
/// WPS credential received.
pub const WPS_EVENT_CRED_RECEIVED: &str = "WPS-CRED-RECEIVED ";
/// WPS session timed out.
pub const WPS_EVENT_TIMEOUT: &str = "WPS-TIMEOUT ";
/// Push button session overlap detected.
pub const WPS_EVENT_OVERLAP: &str = "WPS-OVERLAP-DETECTED ";
