use ethereum_consensus::{builder::ValidatorRegistration, primitives::BlsPublicKey};
use mev_rs::{
    signing::{verify_signed_builder_message, SigningDomain},
    types::SignedValidatorRegistration,
    Error,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

// registrations may lead local time by this many seconds
const MAX_CLOCK_DRIFT_SECS: u64 = 10;

fn validate_registration_is_not_from_future(
    message: &ValidatorRegistration,
    current_timestamp: u64,
) -> Result<(), Error> {
    if message.timestamp > current_timestamp + MAX_CLOCK_DRIFT_SECS {
        Err(Error::RegistrationFromFuture(message.public_key.clone()))
    } else {
        Ok(())
    }
}

/// Latest signed registration per validator public key.
#[derive(Default)]
pub struct ValidatorRegistry {
    registrations: RwLock<HashMap<BlsPublicKey, SignedValidatorRegistration>>,
}

impl ValidatorRegistry {
    /// Returns `true` if `registration` replaced what was known for the validator.
    pub fn process_registration(
        &self,
        registration: &mut SignedValidatorRegistration,
        current_timestamp: u64,
        builder_domain: &SigningDomain,
    ) -> Result<bool, Error> {
        validate_registration_is_not_from_future(&registration.message, current_timestamp)?;

        let latest_timestamp = self
            .registrations
            .read()
            .get(&registration.message.public_key)
            .map(|latest| latest.message.timestamp);
        if let Some(latest_timestamp) = latest_timestamp {
            if registration.message.timestamp <= latest_timestamp {
                let public_key = &registration.message.public_key;
                trace!(%public_key, "ignoring stale registration");
                return Ok(false)
            }
        }

        let public_key = registration.message.public_key.clone();
        verify_signed_builder_message(
            &mut registration.message,
            &registration.signature,
            &public_key,
            builder_domain,
        )?;

        trace!(%public_key, "processed new registration");
        self.registrations.write().insert(public_key, registration.clone());
        Ok(true)
    }

    pub fn get_signed_registration(
        &self,
        public_key: &BlsPublicKey,
    ) -> Option<SignedValidatorRegistration> {
        self.registrations.read().get(public_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }
}
