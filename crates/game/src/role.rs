/// Which end of the link this process is. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Listens, accepts exactly one peer.
    Authority,
    /// Connects to the authority.
    Initiator,
}

impl Role {
    pub fn peer(self) -> Role {
        match self {
            Role::Authority => Role::Initiator,
            Role::Initiator => Role::Authority,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Authority => "Server",
            Role::Initiator => "Client",
        }
    }

    /// Sign applied to the y axis when "up" is held. The two roles are
    /// mirrored so each player sits on its own side of the shared view.
    pub fn up_sign(self) -> f32 {
        match self {
            Role::Authority => -1.0,
            Role::Initiator => 1.0,
        }
    }
}
