use soroban_sdk::{Env, Symbol, contracttype, symbol_short};

use crate::{Error, storage::DataKey};

const QUERY_SEQUENCE: Symbol = symbol_short!("QUERYSEQ");

/// Holdings the contract re-reads from a token after a collaborator call.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BalanceQuery {
    BaseShares,
    LpShares,
}

/// Ticket for one in-flight balance query. Only the matching delivery is accepted, once.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingQuery {
    pub query: BalanceQuery,
    pub sequence: u64,
}

/// Open a query of the given kind. At most one of each kind may be in flight.
pub fn request(env: &Env, query: BalanceQuery) -> Result<PendingQuery, Error> {
    let key = DataKey::PendingQuery(query);
    if env.storage().temporary().has(&key) {
        return Err(Error::CallbackProtocol);
    }
    let sequence: u64 = env
        .storage()
        .instance()
        .get(&QUERY_SEQUENCE)
        .unwrap_or(0)
        + 1;
    env.storage().instance().set(&QUERY_SEQUENCE, &sequence);
    env.storage().temporary().set(&key, &sequence);
    Ok(PendingQuery { query, sequence })
}

/// Accept the delivery of `query` for `ticket` and close it.
pub fn deliver(env: &Env, ticket: &PendingQuery, query: BalanceQuery) -> Result<(), Error> {
    if ticket.query != query {
        return Err(Error::Forbidden);
    }
    let key = DataKey::PendingQuery(query);
    let open: Option<u64> = env.storage().temporary().get(&key);
    match open {
        Some(sequence) if sequence == ticket.sequence => {
            env.storage().temporary().remove(&key);
            Ok(())
        }
        _ => Err(Error::CallbackProtocol),
    }
}
