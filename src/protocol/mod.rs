//! IPMB request/response protocol: frame helpers, validation, command
//! dispatch, response construction, the event-handler side of the bus link
//! and the poll-driven engine that ties them together.
pub mod dispatch;
pub mod engine;
pub mod frame;
pub mod link;
pub mod response;
pub mod traits;
pub mod validator;
