//! Wire protocol: identifiers (C2 supporting types), the persisted room
//! record (C2), and the message catalog (spec.md §6).

pub mod messages;
pub mod room_state;
pub mod types;

pub use messages::{
    GomokuClientMessage, GomokuSeatsView, GomokuServerMessage, RelayMessage, VotesView,
    XiangqiClientMessage, XiangqiSeatsView, XiangqiServerMessage,
};
pub use room_state::{
    now_millis, BoardPos, GomokuMove, GomokuRoom, MillisTimestamp, SeatState, VoteMap,
    XiangqiMove, XiangqiRoom,
};
pub use types::{mint_token, parse_want, Role, RoomKind, SeatToken, Want};
