use crate::core::domain::{
    error::ProxmoxResult,
    value_object::{
        ProxmoxApiToken, ProxmoxHost, ProxmoxPassword, ProxmoxPort, ProxmoxRealm, ProxmoxUrl,
        ProxmoxUsername,
    },
};

/// How requests prove their identity.
#[derive(Debug, Clone)]
pub enum ProxmoxCredential {
    /// Ticket login with a password.
    Password(ProxmoxPassword),
    /// `PVEAPIToken` header; no login round trip.
    ApiToken {
        token: ProxmoxApiToken,
        secret: ProxmoxPassword,
    },
}

/// Everything needed to reach and authenticate against one endpoint.
#[derive(Debug, Clone)]
pub struct ProxmoxConnection {
    proxmox_host: ProxmoxHost,
    proxmox_port: ProxmoxPort,
    proxmox_username: ProxmoxUsername,
    proxmox_credential: ProxmoxCredential,
    proxmox_realm: ProxmoxRealm,
    verify_ssl: bool,
    proxmox_url: ProxmoxUrl,
}

impl ProxmoxConnection {
    pub fn new(
        proxmox_host: ProxmoxHost,
        proxmox_port: ProxmoxPort,
        proxmox_username: ProxmoxUsername,
        proxmox_credential: ProxmoxCredential,
        proxmox_realm: ProxmoxRealm,
        proxmox_secure: bool,
        verify_ssl: bool,
    ) -> ProxmoxResult<Self> {
        let url = ProxmoxUrl::from_parts(&proxmox_host, &proxmox_port, proxmox_secure)?;
        Ok(Self {
            proxmox_host,
            proxmox_port,
            proxmox_username,
            proxmox_credential,
            proxmox_realm,
            verify_ssl,
            proxmox_url: url,
        })
    }

    pub fn proxmox_host(&self) -> &ProxmoxHost {
        &self.proxmox_host
    }

    pub fn proxmox_port(&self) -> &ProxmoxPort {
        &self.proxmox_port
    }

    pub fn proxmox_username(&self) -> &ProxmoxUsername {
        &self.proxmox_username
    }

    pub fn proxmox_credential(&self) -> &ProxmoxCredential {
        &self.proxmox_credential
    }

    pub fn proxmox_realm(&self) -> &ProxmoxRealm {
        &self.proxmox_realm
    }

    /// Whether the server certificate is checked.
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    pub fn proxmox_url(&self) -> &ProxmoxUrl {
        &self.proxmox_url
    }

    /// `user@realm` as sent to the server.
    pub fn user_id(&self) -> String {
        self.proxmox_username.user_id(self.proxmox_realm.as_str())
    }

    pub fn uses_api_token(&self) -> bool {
        matches!(self.proxmox_credential, ProxmoxCredential::ApiToken { .. })
    }
}
