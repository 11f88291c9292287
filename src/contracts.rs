use alloy::sol;

sol! {
    #[sol(rpc)]
    contract ProxyFactory {
        function createProxy(address singleton, bytes data)
            external
            returns (address proxy);
        function createProxyWithNonce(address singleton, bytes initializer, uint256 saltNonce)
            external
            returns (address proxy);
        function createProxyWithCallback(address singleton, bytes initializer, uint256 saltNonce, address callback)
            external
            returns (address proxy);
        function proxyCreationCode() external pure returns (bytes);
        event ProxyCreation(address proxy, address singleton);
    }
}

sol! {
    #[sol(rpc)]
    contract GnosisSafe {
        function setup(
            address[] owners,
            uint256 threshold,
            address to,
            bytes data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address payable paymentReceiver
        ) external;
        function getOwners() external view returns (address[]);
        function getThreshold() external view returns (uint256);
        function addOwnerWithThreshold(address owner, uint256 threshold) external;
        function removeOwner(address prevOwner, address owner, uint256 threshold) external;
        function changeThreshold(uint256 threshold) external;
    }
}
