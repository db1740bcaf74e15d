//! Messages exchanged by the demo application's procedures.

#[derive(Clone, PartialEq, prost::Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct User {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UserList {
    #[prost(message, repeated, tag = "1")]
    pub users: Vec<User>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ById {
    #[prost(uint64, tag = "1")]
    pub id: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Post {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub author_id: u64,
    #[prost(string, tag = "3")]
    pub title: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PostList {
    #[prost(message, repeated, tag = "1")]
    pub posts: Vec<Post>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AddPost {
    #[prost(uint64, tag = "1")]
    pub author_id: u64,
    #[prost(string, tag = "2")]
    pub title: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Health {
    #[prost(string, tag = "1")]
    pub status: String,
}
