pub mod boards;
pub mod cards;

pub use boards::{
    BoardResponse, BoardSummary, ColumnCards, CreateBoardRequest, UpdateBoardRequest,
    UpdateColumnsRequest,
};
pub use cards::{
    AddLabelRequest, CardResponse, CreateCardRequest, MoveCardRequest, UpdateCardRequest,
    UpdateTasksRequest,
};
