//! A set of built-in tools that models can use.

mod users;

pub use users::{
    CreateUserTool, DeleteUserTool, GetUserByIdTool, SearchUsersTool,
    UpdateUserTool, UserCreate, UserServiceClient, UserUpdate,
};
