//! GraphQL documents sent by [`super::ApiClient`].

macro_rules! user_fields {
    () => {
        "id name username email bio avatarUrl createdAt updatedAt"
    };
}

macro_rules! post_fields {
    () => {
        concat!(
            "id imageUrl caption createdAt likeCount likedByCurrentUser ",
            "author { ",
            user_fields!(),
            " } ",
            "comments { id text createdAt author { ",
            user_fields!(),
            " } }"
        )
    };
}

pub const SIGNUP: &str = concat!(
    "mutation Signup($name: String!, $username: String!, $email: String!, $password: String!) { ",
    "signup(name: $name, username: $username, email: $email, password: $password) { token user { ",
    user_fields!(),
    " } } }"
);

pub const LOGIN: &str = concat!(
    "mutation Login($loginIdentifier: String!, $password: String!) { ",
    "login(loginIdentifier: $loginIdentifier, password: $password) { token user { ",
    user_fields!(),
    " } } }"
);

pub const ME: &str = concat!("query Me { me { ", user_fields!(), " } }");

pub const ALL_USERS: &str = concat!("query AllUsers { allUsers { ", user_fields!(), " } }");

pub const USER_PROFILE: &str = concat!(
    "query UserProfile($username: String) { userProfile(username: $username) { ",
    user_fields!(),
    " } }"
);

pub const ALL_POSTS: &str = concat!("query AllPosts { allPosts { ", post_fields!(), " } }");

pub const POSTS_BY_USER: &str = concat!(
    "query PostsByUser($userId: ID!) { postsByUser(userId: $userId) { ",
    post_fields!(),
    " } }"
);

pub const COMMENTS_BY_POST: &str = concat!(
    "query CommentsByPost($postId: ID!) { CommentsByPost(postId: $postId) { id text createdAt author { ",
    user_fields!(),
    " } } }"
);

pub const CREATE_POST: &str = concat!(
    "mutation CreatePost($imageUrl: String!, $caption: String) { ",
    "createPost(imageUrl: $imageUrl, caption: $caption) { ",
    post_fields!(),
    " } }"
);

pub const TOGGLE_LIKE: &str = concat!(
    "mutation ToggleLike($postId: ID!) { toggleLike(postId: $postId) { ",
    post_fields!(),
    " } }"
);

pub const ADD_COMMENT: &str = concat!(
    "mutation AddComment($postId: ID!, $text: String!) { addComment(postId: $postId, text: $text) { ",
    "id text createdAt author { ",
    user_fields!(),
    " } } }"
);

pub const DELETE_POST: &str =
    "mutation DeletePost($id: ID!) { deletePost(id: $id) { success message id code } }";

pub const UPDATE_PROFILE: &str = concat!(
    "mutation UpdateProfile($name: String!, $username: String!, $email: String!, ",
    "$bio: String, $avatarUrl: String) { ",
    "updateProfile(name: $name, username: $username, email: $email, bio: $bio, avatarUrl: $avatarUrl) { ",
    user_fields!(),
    " } }"
);
